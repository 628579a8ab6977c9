//! Access policy
//!
//! The single authority for role- and language-based access decisions.
//! Every entity handler goes through these checks rather than re-deriving
//! role rules inline, so the rules cannot drift between endpoints.
//!
//! Admins and managers see and manage everything. Editors reach a project
//! (and transitively its folders and segments) only when the project's
//! language is among their assigned languages, and can never perform
//! Manage-level operations (lifecycle fields, deletions, stats recompute,
//! user administration).
//!
//! Handlers resolve the resource first and authorize second, so a missing
//! resource is reported as NotFound before any permission verdict.

use scriba_common::db::models::{Project, User};
use scriba_common::{Error, Result};
use sqlx::SqlitePool;

/// What the actor wants to do with the resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    /// View the project/folders/segments
    Read,
    /// Edit segment transcription/translation state
    Edit,
    /// Lifecycle fields, deletion, stats recompute
    Manage,
}

/// Capability decision for an actor on a project
pub async fn can_access_project(
    pool: &SqlitePool,
    actor: &User,
    project: &Project,
    level: AccessLevel,
) -> Result<bool> {
    if actor.role.is_privileged() {
        return Ok(true);
    }
    if level == AccessLevel::Manage {
        return Ok(false);
    }

    let language_ids = crate::db::users::get_user_language_ids(pool, &actor.id).await?;
    Ok(language_ids.contains(&project.language_id))
}

/// Authorize or fail with PermissionDenied
pub async fn authorize_project(
    pool: &SqlitePool,
    actor: &User,
    project: &Project,
    level: AccessLevel,
) -> Result<()> {
    if can_access_project(pool, actor, project, level).await? {
        Ok(())
    } else {
        Err(Error::PermissionDenied(format!(
            "No access to project {}",
            project.id
        )))
    }
}

/// Require an admin/manager role for operations outside any one project
/// (user administration, listing all projects)
pub fn require_privileged(actor: &User) -> Result<()> {
    if actor.role.is_privileged() {
        Ok(())
    } else {
        Err(Error::PermissionDenied(
            "Insufficient permissions".to_string(),
        ))
    }
}

/// Language ids limiting an actor's project listing; `None` means
/// unrestricted (admin/manager)
pub async fn visible_language_ids(pool: &SqlitePool, actor: &User) -> Result<Option<Vec<i64>>> {
    if actor.role.is_privileged() {
        Ok(None)
    } else {
        Ok(Some(
            crate::db::users::get_user_language_ids(pool, &actor.id).await?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::projects::{create_project, NewProject};
    use crate::db::users::{create_user, set_user_languages, NewUser};
    use scriba_common::db::create_all_tables;
    use scriba_common::db::models::{ProjectStatus, UserRole};

    async fn setup() -> (SqlitePool, Project, User, User) {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_all_tables(&pool).await.unwrap();

        let en = crate::db::languages::create_language(&pool, "en", "English").await.unwrap();
        let fi = crate::db::languages::create_language(&pool, "fi", "Finnish").await.unwrap();

        let manager = create_user(&pool, &user("mgr", UserRole::Manager)).await.unwrap();
        let editor = create_user(&pool, &user("ed", UserRole::Editor)).await.unwrap();
        set_user_languages(&pool, &editor.id, &[fi.id]).await.unwrap();

        let project = create_project(
            &pool,
            &NewProject {
                name: "p".to_string(),
                original_filename: "a.mp3".to_string(),
                file_path: String::new(),
                sample_rate: 44100,
                channels: 2,
                language_id: en.id,
                user_id: manager.id.clone(),
                status: ProjectStatus::ReadyForTranscription,
            },
        )
        .await
        .unwrap();

        (pool, project, manager, editor)
    }

    fn user(name: &str, role: UserRole) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: None,
            password_hash: "salt$digest".to_string(),
            first_name: None,
            last_name: None,
            profile_image_url: None,
            role,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_privileged_roles_have_full_access() {
        let (pool, project, manager, _) = setup().await;
        for level in [AccessLevel::Read, AccessLevel::Edit, AccessLevel::Manage] {
            assert!(can_access_project(&pool, &manager, &project, level).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_editor_without_language_is_denied() {
        let (pool, project, _, editor) = setup().await;
        assert!(!can_access_project(&pool, &editor, &project, AccessLevel::Read).await.unwrap());

        let err = authorize_project(&pool, &editor, &project, AccessLevel::Read)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_editor_with_language_can_read_and_edit_but_not_manage() {
        let (pool, project, _, editor) = setup().await;
        set_user_languages(&pool, &editor.id, &[project.language_id]).await.unwrap();

        assert!(can_access_project(&pool, &editor, &project, AccessLevel::Read).await.unwrap());
        assert!(can_access_project(&pool, &editor, &project, AccessLevel::Edit).await.unwrap());
        assert!(!can_access_project(&pool, &editor, &project, AccessLevel::Manage).await.unwrap());
    }

    #[tokio::test]
    async fn test_visible_language_ids() {
        let (pool, _, manager, editor) = setup().await;
        assert_eq!(visible_language_ids(&pool, &manager).await.unwrap(), None);

        let visible = visible_language_ids(&pool, &editor).await.unwrap().unwrap();
        assert_eq!(visible.len(), 1);
    }

    #[tokio::test]
    async fn test_require_privileged() {
        let (_, _, manager, editor) = setup().await;
        assert!(require_privileged(&manager).is_ok());
        assert!(require_privileged(&editor).is_err());
    }
}
