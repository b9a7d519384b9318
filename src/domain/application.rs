use super::identity::OwnerId;
use crate::error::{Result, ServiceError};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(Uuid);

impl ApplicationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ApplicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ApplicationId {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ServiceError::Validation(format!("'{}' is not an application id", s)))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub gender: String,
    pub address: String,
    pub state_of_origin: String,
    pub nationality: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AcademicBackground {
    pub previous_school: String,
    pub qualification: String,
    pub graduation_year: Option<i32>,
    pub grades: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramSelection {
    pub program: String,
    pub level: String,
    pub start_session: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Accommodation {
    pub required: bool,
    pub preference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Referee {
    pub name: String,
    pub relationship: String,
    pub email: String,
    pub phone: String,
}

/// The form sections as entered so far. Any section may be absent while
/// the application is a draft.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSections {
    pub personal_info: Option<PersonalInfo>,
    pub academic_background: Option<AcademicBackground>,
    pub program_selection: Option<ProgramSelection>,
    pub accommodation: Option<Accommodation>,
    pub referee: Option<Referee>,
}

/// Sections that passed validation and may be submitted.
///
/// Only obtainable through [`FinalApplication::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalApplication(ApplicationSections);

impl FinalApplication {
    pub fn validate(sections: ApplicationSections) -> Result<Self> {
        let mut problems = Vec::new();

        match &sections.personal_info {
            None => problems.push("personal information is missing".to_string()),
            Some(p) => {
                require_text(&mut problems, "first name", &p.first_name);
                require_text(&mut problems, "last name", &p.last_name);
                require_text(&mut problems, "phone", &p.phone);
                if !looks_like_email(&p.email) {
                    problems.push("a valid email address is required".to_string());
                }
            }
        }

        match &sections.academic_background {
            None => problems.push("academic background is missing".to_string()),
            Some(a) => {
                require_text(&mut problems, "previous school", &a.previous_school);
                require_text(&mut problems, "qualification", &a.qualification);
                let current_year = Utc::now().year();
                match a.graduation_year {
                    Some(year) if (1950..=current_year + 1).contains(&year) => {}
                    Some(year) => problems.push(format!("graduation year {} is not plausible", year)),
                    None => problems.push("graduation year is required".to_string()),
                }
            }
        }

        match &sections.program_selection {
            None => problems.push("program selection is missing".to_string()),
            Some(p) => require_text(&mut problems, "program", &p.program),
        }

        if let Some(accommodation) = &sections.accommodation
            && accommodation.required
        {
            require_text(
                &mut problems,
                "accommodation preference",
                &accommodation.preference,
            );
        }

        match &sections.referee {
            None => problems.push("referee details are missing".to_string()),
            Some(r) => {
                require_text(&mut problems, "referee name", &r.name);
                require_text(&mut problems, "referee phone", &r.phone);
            }
        }

        if problems.is_empty() {
            Ok(Self(sections))
        } else {
            Err(ServiceError::Validation(problems.join("; ")))
        }
    }

    pub fn sections(&self) -> &ApplicationSections {
        &self.0
    }

    pub fn into_sections(self) -> ApplicationSections {
        self.0
    }
}

fn require_text(problems: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        problems.push(format!("{} is required", field));
    }
}

fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

/// A form as handed to the submission service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationForm {
    Draft(ApplicationSections),
    Final(FinalApplication),
}

impl ApplicationForm {
    pub fn sections(&self) -> &ApplicationSections {
        match self {
            Self::Draft(sections) => sections,
            Self::Final(app) => app.sections(),
        }
    }

    pub fn into_sections(self) -> ApplicationSections {
        match self {
            Self::Draft(sections) => sections,
            Self::Final(app) => app.into_sections(),
        }
    }
}

impl From<ApplicationSections> for ApplicationForm {
    fn from(sections: ApplicationSections) -> Self {
        Self::Draft(sections)
    }
}

impl From<FinalApplication> for ApplicationForm {
    fn from(app: FinalApplication) -> Self {
        Self::Final(app)
    }
}

/// A persisted application, owned by the identity that created it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    #[serde(rename = "user_id")]
    pub owner_id: OwnerId,
    #[serde(flatten)]
    pub sections: ApplicationSections,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationRecord {
    pub fn new(
        owner_id: OwnerId,
        sections: ApplicationSections,
        status: ApplicationStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ApplicationId::new(),
            owner_id,
            sections,
            status,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The mutable part of a record, applied by an owner-scoped update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationChanges {
    #[serde(flatten)]
    pub sections: ApplicationSections,
    pub status: ApplicationStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub success: bool,
    pub application_id: ApplicationId,
}
