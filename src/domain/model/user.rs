use crate::domain::error::DomainError;
use crate::domain::model::{Role, UserId};

/// 検証済みの呼び出し元
/// 認証済みトークンから復元された値で、ドメイン内で再検証しない
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedIdentity {
    user_id: UserId,
    role: Role,
}

impl VerifiedIdentity {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// 許可されたロールのいずれかを持つか
    pub fn has_any_role(&self, allowed: &[Role]) -> bool {
        allowed.contains(&self.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// ユーザープロフィール
/// 登録とパスワードは外部のユーザー管理が担当する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl UserProfile {
    /// 変更後のプロフィールを検証する
    ///
    /// 名前は空白のみ不可、メールアドレスは `local@domain` の形式であること
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidValue("名前は必須です".to_string()));
        }
        let well_formed = self
            .email
            .split_once('@')
            .map(|(local, domain)| {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
            })
            .unwrap_or(false);
        if !well_formed || self.email.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidValue(format!(
                "メールアドレスの形式が不正です: {}",
                self.email
            )));
        }
        Ok(())
    }
}
