use crate::domain::image::ImageMeta;
use crate::domain::user::UserProfile;
use crate::error::{AppError, Result};
use time::OffsetDateTime;
use uuid::Uuid;

pub const MAX_GROUP_NAME_CHARS: usize = 100;
pub const MAX_GROUP_DESCRIPTION_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct Group {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) admin_id: Uuid,
    pub(crate) member_ids: Vec<Uuid>,
    pub(crate) image: Option<ImageMeta>,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl Group {
    #[must_use]
    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.member_ids.contains(&user_id)
    }

    #[must_use]
    pub fn is_admin(&self, user_id: Uuid) -> bool {
        self.admin_id == user_id
    }

    /// # Errors
    /// Returns `AppError::Forbidden` unless `user_id` is a member.
    pub fn ensure_member(&self, user_id: Uuid) -> Result<()> {
        if self.is_member(user_id) { Ok(()) } else { Err(AppError::forbidden("Access denied")) }
    }

    /// # Errors
    /// Returns `AppError::Forbidden` with `action` in the message unless `user_id` is the admin.
    pub fn ensure_admin(&self, user_id: Uuid, action: &str) -> Result<()> {
        if self.is_admin(user_id) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!("Only group admin can {action}")))
        }
    }

    /// Members from `candidates` that are not in the group yet, in request order without repeats.
    ///
    /// # Errors
    /// Returns `AppError::Forbidden` for non-admins and `AppError::BadRequest` when nothing is new.
    pub fn plan_additions(&self, actor: Uuid, candidates: &[Uuid]) -> Result<Vec<Uuid>> {
        self.ensure_admin(actor, "add members")?;
        if candidates.is_empty() {
            return Err(AppError::bad_request("Member IDs are required"));
        }

        let mut additions: Vec<Uuid> = Vec::with_capacity(candidates.len());
        for &id in candidates {
            if !self.is_member(id) && !additions.contains(&id) {
                additions.push(id);
            }
        }

        if additions.is_empty() {
            return Err(AppError::bad_request("All users are already members"));
        }
        Ok(additions)
    }

    /// Admins may remove anyone but themselves; members may remove only themselves.
    ///
    /// # Errors
    /// `Forbidden` when the actor lacks the right, `BadRequest` for the admin, `NotFound` for non-members.
    pub fn authorize_removal(&self, actor: Uuid, member: Uuid) -> Result<()> {
        if !self.is_admin(actor) && actor != member {
            return Err(AppError::forbidden("Only admin can remove other members"));
        }
        if self.is_admin(member) {
            return Err(AppError::bad_request("Cannot remove group admin"));
        }
        if !self.is_member(member) {
            return Err(AppError::not_found("Member not found in group"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub name: String,
    pub description: String,
    pub admin_id: Uuid,
    pub member_ids: Vec<Uuid>,
}

impl NewGroup {
    /// The admin always comes first in the member list; duplicates are dropped.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` if the name or description is out of bounds.
    pub fn new(admin_id: Uuid, name: &str, description: Option<&str>, member_ids: &[Uuid]) -> Result<Self> {
        let name = parse_group_name(name)?;
        let description = parse_description(description)?;

        let mut members = vec![admin_id];
        for &id in member_ids {
            if !members.contains(&id) {
                members.push(id);
            }
        }

        Ok(Self { name, description, admin_id, member_ids: members })
    }
}

/// Partial update of a group's descriptive fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl GroupChanges {
    /// # Errors
    /// Returns `AppError::BadRequest` if nothing changes or a field is out of bounds.
    pub fn new(name: Option<&str>, description: Option<&str>) -> Result<Self> {
        if name.is_none() && description.is_none() {
            return Err(AppError::bad_request("Nothing to update"));
        }
        Ok(Self {
            name: name.map(parse_group_name).transpose()?,
            description: description.map(|d| parse_description(Some(d))).transpose()?,
        })
    }
}

fn parse_group_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("Group name is required"));
    }
    if name.chars().count() > MAX_GROUP_NAME_CHARS {
        return Err(AppError::bad_request(format!(
            "Group name must be between 1 and {MAX_GROUP_NAME_CHARS} characters"
        )));
    }
    Ok(name.to_string())
}

fn parse_description(raw: Option<&str>) -> Result<String> {
    let description = raw.map(str::trim).unwrap_or_default();
    if description.chars().count() > MAX_GROUP_DESCRIPTION_CHARS {
        return Err(AppError::bad_request(format!(
            "Description must be at most {MAX_GROUP_DESCRIPTION_CHARS} characters"
        )));
    }
    Ok(description.to_string())
}

/// A group with member and admin references resolved to profiles.
#[derive(Debug, Clone)]
pub struct GroupView {
    pub group: Group,
    pub members: Vec<UserProfile>,
    pub admin: Option<UserProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(admin: Uuid, members: &[Uuid]) -> Group {
        let mut member_ids = vec![admin];
        member_ids.extend_from_slice(members);
        Group {
            id: Uuid::new_v4(),
            name: "team".into(),
            description: String::new(),
            admin_id: admin,
            member_ids,
            image: None,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn test_new_group_includes_admin_once() {
        let (admin, a, b) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let new_group = NewGroup::new(admin, "  Team  ", None, &[a, admin, b, a]).unwrap();

        assert_eq!(new_group.name, "Team");
        assert_eq!(new_group.member_ids, vec![admin, a, b]);
        assert_eq!(new_group.description, "");
    }

    #[test]
    fn test_new_group_bounds() {
        let admin = Uuid::new_v4();
        assert!(NewGroup::new(admin, "   ", None, &[]).is_err());
        assert!(NewGroup::new(admin, &"n".repeat(MAX_GROUP_NAME_CHARS + 1), None, &[]).is_err());
        assert!(NewGroup::new(admin, "ok", Some(&"d".repeat(MAX_GROUP_DESCRIPTION_CHARS + 1)), &[]).is_err());
    }

    #[test]
    fn test_plan_additions() {
        let (admin, member, newcomer) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let group = group(admin, &[member]);

        assert_eq!(group.plan_additions(admin, &[member, newcomer, newcomer]).unwrap(), vec![newcomer]);
        assert!(matches!(group.plan_additions(member, &[newcomer]), Err(AppError::Forbidden(_))));
        assert!(matches!(group.plan_additions(admin, &[member]), Err(AppError::BadRequest(_))));
        assert!(matches!(group.plan_additions(admin, &[]), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_authorize_removal() {
        let (admin, a, b, outsider) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let group = group(admin, &[a, b]);

        assert!(group.authorize_removal(admin, a).is_ok());
        assert!(group.authorize_removal(a, a).is_ok());
        assert!(matches!(group.authorize_removal(a, b), Err(AppError::Forbidden(_))));
        assert!(matches!(group.authorize_removal(admin, admin), Err(AppError::BadRequest(_))));
        assert!(matches!(group.authorize_removal(a, admin), Err(AppError::Forbidden(_))));
        assert!(matches!(group.authorize_removal(admin, outsider), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_group_changes() {
        assert!(GroupChanges::new(None, None).is_err());
        let changes = GroupChanges::new(Some(" New "), None).unwrap();
        assert_eq!(changes.name.as_deref(), Some("New"));
        assert!(changes.description.is_none());
    }
}
