pub mod application_writer;
