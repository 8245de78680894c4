//! Profile aggregate: one per user, owning the experience sub-collection.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::UserId;

/// Fixed set of social link providers a profile may carry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SocialProvider {
    Website,
    Github,
    Linkedin,
    Twitter,
    Facebook,
    Instagram,
    Youtube,
}

impl SocialProvider {
    /// Returns the wire string representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::Github => "github",
            Self::Linkedin => "linkedin",
            Self::Twitter => "twitter",
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Youtube => "youtube",
        }
    }
}

impl fmt::Display for SocialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of one experience entry, unique within its owning profile.
///
/// Identifiers are random UUIDs and are never reused within a profile's
/// lifetime, even after the entry is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExperienceId(Uuid);

impl ExperienceId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ExperienceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Fields supplied when adding an experience entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceDraft {
    pub title: String,
    pub company: String,
    pub from_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One experience entry nested in a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct Experience {
    id: ExperienceId,
    title: String,
    company: String,
    from_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    to_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Experience {
    fn new(id: ExperienceId, draft: ExperienceDraft) -> Self {
        Self {
            id,
            title: draft.title,
            company: draft.company,
            from_date: draft.from_date,
            to_date: draft.to_date,
            location: draft.location,
            description: draft.description,
        }
    }

    /// Identifier, stable across edits for the entry's lifetime.
    pub const fn id(&self) -> ExperienceId {
        self.id
    }

    /// Role title.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Employer name.
    pub fn company(&self) -> &str {
        self.company.as_str()
    }
}

/// Top-level profile fields carried by an upsert request.
///
/// Absent fields leave the stored value unchanged (partial update). The
/// experience sub-collection is never touched by an upsert; it has dedicated
/// add/remove operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social: Option<BTreeMap<SocialProvider, Url>>,
}

/// Rejections produced by the pure experience mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExperienceRejection {
    /// No entry with the requested id exists in this profile.
    #[error("experience entry {id} not found")]
    NotFound { id: ExperienceId },
}

/// Developer profile, keyed one-to-one by the owning user.
///
/// ## Invariants
/// - At most one profile exists per [`UserId`] (enforced by the repository).
/// - `experience` is ordered most-recently-added first.
/// - Experience ids are unique within the profile and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct Profile {
    user_id: UserId,
    status: String,
    skills: Vec<String>,
    social: BTreeMap<SocialProvider, Url>,
    experience: Vec<Experience>,
}

impl Profile {
    /// Build a fresh profile for `user_id` from the submitted fields, with an
    /// empty experience collection.
    pub fn new(user_id: UserId, fields: ProfileFields) -> Self {
        Self {
            user_id,
            status: fields.status.unwrap_or_default(),
            skills: fields.skills.unwrap_or_default(),
            social: fields.social.unwrap_or_default(),
            experience: Vec::new(),
        }
    }

    /// Create-or-update entry point used by the profile service.
    ///
    /// With no existing profile this builds a new one; otherwise it applies
    /// the partial update to the existing snapshot.
    pub fn upsert(existing: Option<Self>, user_id: UserId, fields: ProfileFields) -> Self {
        match existing {
            None => Self::new(user_id, fields),
            Some(profile) => profile.with_fields_applied(fields),
        }
    }

    /// Owning user.
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Professional status line.
    pub fn status(&self) -> &str {
        self.status.as_str()
    }

    /// Ordered skill list.
    pub fn skills(&self) -> &[String] {
        self.skills.as_slice()
    }

    /// Social links by provider.
    pub const fn social(&self) -> &BTreeMap<SocialProvider, Url> {
        &self.social
    }

    /// Experience entries, most recently added first.
    pub fn experience(&self) -> &[Experience] {
        self.experience.as_slice()
    }

    /// Copy with the top-level fields present in `fields` replaced.
    ///
    /// Experience is untouched: upserts only ever edit the scalar and
    /// mapping fields.
    pub fn with_fields_applied(mut self, fields: ProfileFields) -> Self {
        if let Some(status) = fields.status {
            self.status = status;
        }
        if let Some(skills) = fields.skills {
            self.skills = skills;
        }
        if let Some(social) = fields.social {
            self.social = social;
        }
        self
    }

    /// Copy with a new experience entry prepended.
    ///
    /// The entry receives a fresh id, collision-checked against every id
    /// currently in the collection.
    pub fn with_experience_added(&self, draft: ExperienceDraft) -> Self {
        let mut id = ExperienceId::random();
        while self.experience.iter().any(|entry| entry.id == id) {
            id = ExperienceId::random();
        }

        let mut next = self.clone();
        next.experience.insert(0, Experience::new(id, draft));
        next
    }

    /// Copy with the entry identified by `id` removed.
    ///
    /// Presence is checked explicitly before any index is computed; an absent
    /// id is a rejection, never a silent no-op. The relative order of the
    /// remaining entries is preserved.
    pub fn with_experience_removed(
        &self,
        id: ExperienceId,
    ) -> Result<Self, ExperienceRejection> {
        let position = self
            .experience
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(ExperienceRejection::NotFound { id })?;

        let mut next = self.clone();
        next.experience.remove(position);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};

    pub(crate) fn draft(title: &str) -> ExperienceDraft {
        ExperienceDraft {
            title: title.to_owned(),
            company: "Acme".to_owned(),
            from_date: NaiveDate::from_ymd_opt(2020, 1, 6).expect("valid date"),
            to_date: None,
            location: None,
            description: None,
        }
    }

    #[fixture]
    fn profile() -> Profile {
        Profile::new(
            UserId::random(),
            ProfileFields {
                status: Some("Developer".to_owned()),
                skills: Some(vec!["rust".to_owned(), "sql".to_owned()]),
                social: None,
            },
        )
    }

    #[rstest]
    fn new_profile_starts_with_empty_experience(profile: Profile) {
        assert!(profile.experience().is_empty());
        assert_eq!(profile.status(), "Developer");
    }

    #[rstest]
    fn added_experience_is_prepended(profile: Profile) {
        let profile = profile.with_experience_added(draft("Eng"));
        let profile = profile.with_experience_added(draft("Lead"));

        let titles: Vec<_> = profile.experience().iter().map(Experience::title).collect();
        assert_eq!(titles, vec!["Lead", "Eng"]);
    }

    #[rstest]
    fn removal_targets_exactly_the_requested_entry(profile: Profile) {
        let profile = profile
            .with_experience_added(draft("Eng"))
            .with_experience_added(draft("Lead"))
            .with_experience_added(draft("Principal"));
        let middle = profile.experience()[1].id();

        let after = profile
            .with_experience_removed(middle)
            .expect("entry present");

        let titles: Vec<_> = after.experience().iter().map(Experience::title).collect();
        assert_eq!(titles, vec!["Principal", "Eng"]);
        assert!(after.experience().iter().all(|entry| entry.id() != middle));
    }

    #[rstest]
    fn removing_an_absent_entry_is_rejected(profile: Profile) {
        let profile = profile.with_experience_added(draft("Eng"));
        let unknown = ExperienceId::random();

        let rejection = profile
            .with_experience_removed(unknown)
            .expect_err("absent id rejected");

        assert_eq!(rejection, ExperienceRejection::NotFound { id: unknown });
        assert_eq!(profile.experience().len(), 1);
    }

    #[rstest]
    fn remove_then_remove_again_rejects(profile: Profile) {
        let profile = profile
            .with_experience_added(draft("Eng"))
            .with_experience_added(draft("Lead"));
        let lead = profile.experience()[0].id();

        let after = profile.with_experience_removed(lead).expect("entry present");
        assert_eq!(after.experience().len(), 1);
        assert_eq!(after.experience()[0].title(), "Eng");

        let rejection = after
            .with_experience_removed(lead)
            .expect_err("id already removed");
        assert_eq!(rejection, ExperienceRejection::NotFound { id: lead });
    }

    #[rstest]
    fn upsert_replaces_only_supplied_fields(profile: Profile) {
        let profile = profile.with_experience_added(draft("Eng"));
        let before_experience = profile.experience().to_vec();

        let updated = Profile::upsert(
            Some(profile),
            UserId::random(),
            ProfileFields {
                status: Some("Architect".to_owned()),
                skills: None,
                social: None,
            },
        );

        assert_eq!(updated.status(), "Architect");
        assert_eq!(updated.skills(), ["rust".to_owned(), "sql".to_owned()]);
        assert_eq!(updated.experience(), before_experience.as_slice());
    }

    #[rstest]
    fn upsert_without_existing_profile_creates_one() {
        let user_id = UserId::random();
        let created = Profile::upsert(
            None,
            user_id,
            ProfileFields {
                status: Some("Student".to_owned()),
                ..ProfileFields::default()
            },
        );

        assert_eq!(created.user_id(), user_id);
        assert_eq!(created.status(), "Student");
        assert!(created.experience().is_empty());
    }

    #[rstest]
    fn social_links_round_trip_with_snake_case_providers(profile: Profile) {
        let mut social = BTreeMap::new();
        social.insert(
            SocialProvider::Github,
            Url::parse("https://github.com/ada").expect("valid url"),
        );
        let profile = profile.with_fields_applied(ProfileFields {
            social: Some(social),
            ..ProfileFields::default()
        });

        let encoded = serde_json::to_value(&profile).expect("serialise");
        assert!(encoded["social"]["github"].is_string());
        let decoded: Profile = serde_json::from_value(encoded).expect("deserialise");
        assert_eq!(decoded, profile);
    }
}
