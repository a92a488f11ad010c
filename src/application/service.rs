mod booking_query_service;
mod event_query_service;
mod user_query_service;

pub use booking_query_service::{BookingDetails, BookingQueryService};
pub use event_query_service::EventQueryService;
pub use user_query_service::UserQueryService;

use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{
    Booking, BookingId, Event, EventDetails, EventId, Money, Role, TicketQuantity, UserId,
    UserProfile, VerifiedIdentity,
};
use crate::domain::port::{BookingRepository, EventRepository, RepositoryError, UserDirectory};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// 予約の最大試行回数
/// 条件付き減算が競合に負けた場合に一度だけ再試行する
const MAX_RESERVATION_ATTEMPTS: u32 = 2;

/// 予約アプリケーションサービス
/// チケットの予約とキャンセルを担当する
pub struct BookingApplicationService {
    event_repository: Arc<dyn EventRepository>,
    booking_repository: Arc<dyn BookingRepository>,
}

impl BookingApplicationService {
    /// 新しい予約アプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `event_repository` - イベントリポジトリ
    /// * `booking_repository` - 予約リポジトリ
    pub fn new(
        event_repository: Arc<dyn EventRepository>,
        booking_repository: Arc<dyn BookingRepository>,
    ) -> Self {
        Self {
            event_repository,
            booking_repository,
        }
    }

    /// チケットを予約する
    ///
    /// 枚数の検証は `TicketQuantity` の生成時に済んでいる。
    /// イベントの存在、残りチケット数の順に確認し、
    /// 予約の保存と在庫の減算を1つの原子的な操作で行う
    ///
    /// # Arguments
    /// * `event_id` - イベントID
    /// * `quantity` - 予約枚数
    /// * `identity` - 検証済みの呼び出し元
    ///
    /// # Returns
    /// * `Ok(Booking)` - 作成された予約
    /// * `Err(ApplicationError::NotFound)` - イベントが存在しない
    /// * `Err(ApplicationError::DomainError(InsufficientInventory))` - 在庫不足
    pub async fn reserve(
        &self,
        event_id: EventId,
        quantity: TicketQuantity,
        identity: &VerifiedIdentity,
    ) -> Result<Booking, ApplicationError> {
        for attempt in 1..=MAX_RESERVATION_ATTEMPTS {
            let event = self.find_event(event_id).await?;
            let booking = Booking::reserve(
                self.booking_repository.next_identity(),
                identity.user_id(),
                &event,
                quantity,
            )?;

            match self.booking_repository.reserve(&booking).await {
                Ok(()) => {
                    info!(
                        booking_id = %booking.id(),
                        event_id = %event_id,
                        user_id = %identity.user_id(),
                        quantity = quantity.value(),
                        total_price = booking.total_price().amount(),
                        "booking reserved"
                    );
                    return Ok(booking);
                }
                Err(RepositoryError::Conflict(reason)) => {
                    warn!(
                        event_id = %event_id,
                        attempt,
                        %reason,
                        "reservation lost a concurrent update"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(DomainError::InsufficientInventory.into())
    }

    /// 予約をキャンセルし、チケットを在庫に戻す
    ///
    /// 在庫を戻す前に呼び出し元が予約の所有者であることを確認する
    ///
    /// # Returns
    /// * `Ok(Booking)` - キャンセルされた予約
    /// * `Err(ApplicationError::NotFound)` - 予約が存在しない
    /// * `Err(ApplicationError::Forbidden)` - 他のユーザーの予約
    /// * `Err(ApplicationError::DomainError(AlreadyCanceled))` - 既にキャンセル済み
    pub async fn cancel(
        &self,
        booking_id: BookingId,
        identity: &VerifiedIdentity,
    ) -> Result<Booking, ApplicationError> {
        let mut booking = self
            .booking_repository
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("予約が見つかりません: {}", booking_id))
            })?;

        if !booking.is_owned_by(identity.user_id()) {
            return Err(ApplicationError::Forbidden(
                "他のユーザーの予約はキャンセルできません".to_string(),
            ));
        }

        booking.cancel()?;

        match self.booking_repository.cancel(&booking).await {
            Ok(()) => {
                info!(
                    booking_id = %booking_id,
                    event_id = %booking.event_id(),
                    quantity = booking.quantity().value(),
                    "booking canceled"
                );
                Ok(booking)
            }
            Err(RepositoryError::Conflict(reason)) => {
                // 同時に実行されたキャンセルに負けた場合は既にキャンセル済み
                let canceled_concurrently = self
                    .booking_repository
                    .find_by_id(booking_id)
                    .await?
                    .is_some_and(|current| current.is_canceled());
                if canceled_concurrently {
                    Err(DomainError::AlreadyCanceled.into())
                } else {
                    warn!(booking_id = %booking_id, %reason, "cancellation rolled back");
                    Err(ApplicationError::PersistenceConflict(reason))
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_event(&self, event_id: EventId) -> Result<Event, ApplicationError> {
        self.event_repository
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("イベントが見つかりません: {}", event_id))
            })
    }
}

/// イベントの部分更新
/// 指定された項目だけを変更する。チケット数は変更できない
#[derive(Debug, Clone, Default)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub ticket_price: Option<Money>,
}

impl EventChanges {
    fn apply_to(self, details: &EventDetails) -> EventDetails {
        EventDetails {
            title: self.title.unwrap_or_else(|| details.title.clone()),
            description: self.description.unwrap_or_else(|| details.description.clone()),
            date: self.date.unwrap_or(details.date),
            location: self.location.unwrap_or_else(|| details.location.clone()),
            category: self.category.unwrap_or_else(|| details.category.clone()),
            images: self.images.unwrap_or_else(|| details.images.clone()),
        }
    }
}

/// イベントアプリケーションサービス
/// 主催者によるイベントの登録、更新、削除を担当する
pub struct EventApplicationService {
    event_repository: Arc<dyn EventRepository>,
}

impl EventApplicationService {
    /// 新しいイベントアプリケーションサービスを作成
    pub fn new(event_repository: Arc<dyn EventRepository>) -> Self {
        Self { event_repository }
    }

    /// 新しいイベントを登録
    /// 呼び出し元が主催者になる
    ///
    /// # Arguments
    /// * `details` - 説明情報
    /// * `ticket_price` - チケット単価
    /// * `total_tickets` - 総チケット数
    /// * `identity` - 検証済みの呼び出し元
    pub async fn create_event(
        &self,
        details: EventDetails,
        ticket_price: Money,
        total_tickets: u32,
        identity: &VerifiedIdentity,
    ) -> Result<Event, ApplicationError> {
        let event = Event::new(
            self.event_repository.next_identity(),
            identity.user_id(),
            details,
            ticket_price,
            total_tickets,
        )?;
        self.event_repository.insert(&event).await?;
        info!(
            event_id = %event.id(),
            organizer_id = %identity.user_id(),
            total_tickets,
            "event created"
        );
        Ok(event)
    }

    /// イベントの説明情報とチケット単価を更新
    /// 主催者本人または管理者のみ
    pub async fn update_event(
        &self,
        event_id: EventId,
        changes: EventChanges,
        identity: &VerifiedIdentity,
    ) -> Result<Event, ApplicationError> {
        let mut event = self.find_manageable_event(event_id, identity).await?;

        if let Some(ticket_price) = changes.ticket_price {
            event.change_ticket_price(ticket_price);
        }
        let details = changes.apply_to(event.details());
        event.update_details(details)?;

        if !self.event_repository.update_details(&event).await? {
            return Err(ApplicationError::NotFound(format!(
                "イベントが見つかりません: {}",
                event_id
            )));
        }
        info!(event_id = %event_id, "event updated");

        // 残りチケット数は最新の値を返す
        self.event_repository
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("イベントが見つかりません: {}", event_id))
            })
    }

    /// イベントを削除
    /// 主催者本人または管理者のみ。未キャンセルの予約がある場合は削除できない
    pub async fn delete_event(
        &self,
        event_id: EventId,
        identity: &VerifiedIdentity,
    ) -> Result<(), ApplicationError> {
        self.find_manageable_event(event_id, identity).await?;

        match self
            .event_repository
            .delete_if_no_active_bookings(event_id)
            .await
        {
            Ok(true) => {
                info!(event_id = %event_id, "event deleted");
                Ok(())
            }
            Ok(false) => Err(ApplicationError::NotFound(format!(
                "イベントが見つかりません: {}",
                event_id
            ))),
            Err(RepositoryError::Conflict(reason)) => {
                warn!(event_id = %event_id, %reason, "event deletion refused");
                Err(ApplicationError::Conflict(reason))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_manageable_event(
        &self,
        event_id: EventId,
        identity: &VerifiedIdentity,
    ) -> Result<Event, ApplicationError> {
        let event = self
            .event_repository
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("イベントが見つかりません: {}", event_id))
            })?;

        if !identity.is_admin() && !event.is_organized_by(identity.user_id()) {
            return Err(ApplicationError::Forbidden(
                "このイベントを管理する権限がありません".to_string(),
            ));
        }
        Ok(event)
    }
}

/// プロフィールの部分更新
/// 呼び出し元が自分の名前とメールアドレスを変更する
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// 管理者によるユーザーの部分更新
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl UserChanges {
    fn apply_to(self, profile: &UserProfile) -> UserProfile {
        UserProfile {
            id: profile.id,
            name: self.name.unwrap_or_else(|| profile.name.clone()),
            email: self.email.unwrap_or_else(|| profile.email.clone()),
            role: self.role.unwrap_or(profile.role),
        }
    }
}

impl From<ProfileChanges> for UserChanges {
    fn from(changes: ProfileChanges) -> Self {
        Self {
            name: changes.name,
            email: changes.email,
            role: None,
        }
    }
}

/// ユーザーアプリケーションサービス
/// プロフィールの更新と、管理者によるユーザーの更新・削除を担当する
pub struct UserApplicationService {
    user_directory: Arc<dyn UserDirectory>,
}

impl UserApplicationService {
    pub fn new(user_directory: Arc<dyn UserDirectory>) -> Self {
        Self { user_directory }
    }

    /// 呼び出し元のプロフィールを更新
    /// ロールは変更できない
    pub async fn update_profile(
        &self,
        changes: ProfileChanges,
        identity: &VerifiedIdentity,
    ) -> Result<UserProfile, ApplicationError> {
        let profile = self.apply_changes(identity.user_id(), changes.into()).await?;
        info!(user_id = %profile.id, "profile updated");
        Ok(profile)
    }

    /// 指定されたユーザーを更新（管理者のみ）
    pub async fn update_user(
        &self,
        user_id: UserId,
        changes: UserChanges,
        identity: &VerifiedIdentity,
    ) -> Result<UserProfile, ApplicationError> {
        require_admin(identity)?;
        let profile = self.apply_changes(user_id, changes).await?;
        info!(
            user_id = %profile.id,
            role = %profile.role,
            admin_id = %identity.user_id(),
            "user updated"
        );
        Ok(profile)
    }

    /// 指定されたユーザーを削除（管理者のみ）
    /// 既存の予約は残り、予約詳細ではユーザーが未解決になる
    pub async fn delete_user(
        &self,
        user_id: UserId,
        identity: &VerifiedIdentity,
    ) -> Result<(), ApplicationError> {
        require_admin(identity)?;
        if !self.user_directory.delete(user_id).await? {
            return Err(user_not_found(user_id));
        }
        info!(user_id = %user_id, admin_id = %identity.user_id(), "user deleted");
        Ok(())
    }

    async fn apply_changes(
        &self,
        user_id: UserId,
        changes: UserChanges,
    ) -> Result<UserProfile, ApplicationError> {
        let current = self
            .user_directory
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| user_not_found(user_id))?;

        let updated = changes.apply_to(&current);
        updated.validate()?;

        match self.user_directory.update(&updated).await {
            Ok(true) => Ok(updated),
            Ok(false) => Err(user_not_found(user_id)),
            Err(RepositoryError::Conflict(reason)) => Err(ApplicationError::Conflict(reason)),
            Err(err) => Err(err.into()),
        }
    }
}

pub(crate) fn require_admin(identity: &VerifiedIdentity) -> Result<(), ApplicationError> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(ApplicationError::Forbidden(
            "この操作には管理者権限が必要です".to_string(),
        ))
    }
}

pub(crate) fn user_not_found(user_id: UserId) -> ApplicationError {
    ApplicationError::NotFound(format!("ユーザーが見つかりません: {}", user_id))
}
