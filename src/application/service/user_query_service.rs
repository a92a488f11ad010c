use crate::application::service::{require_admin, user_not_found};
use crate::application::ApplicationError;
use crate::domain::model::{UserId, UserProfile, VerifiedIdentity};
use crate::domain::port::UserDirectory;
use std::sync::Arc;

/// ユーザークエリサービス
/// 呼び出し元のプロフィールと、管理者向けのユーザー一覧を提供する
pub struct UserQueryService {
    user_directory: Arc<dyn UserDirectory>,
}

impl UserQueryService {
    pub fn new(user_directory: Arc<dyn UserDirectory>) -> Self {
        Self { user_directory }
    }

    /// 呼び出し元のプロフィールを取得
    pub async fn get_profile(
        &self,
        identity: &VerifiedIdentity,
    ) -> Result<UserProfile, ApplicationError> {
        self.user_directory
            .find_by_id(identity.user_id())
            .await?
            .ok_or_else(|| user_not_found(identity.user_id()))
    }

    /// すべてのユーザーを取得（管理者のみ）
    pub async fn list_users(
        &self,
        identity: &VerifiedIdentity,
    ) -> Result<Vec<UserProfile>, ApplicationError> {
        require_admin(identity)?;
        Ok(self.user_directory.find_all().await?)
    }

    /// 指定されたユーザーを取得（管理者のみ）
    pub async fn get_user(
        &self,
        user_id: UserId,
        identity: &VerifiedIdentity,
    ) -> Result<UserProfile, ApplicationError> {
        require_admin(identity)?;
        self.user_directory
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| user_not_found(user_id))
    }
}
