// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::model::{Booking, BookingId, Event, EventId, UserId, UserProfile};
use async_trait::async_trait;

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum RepositoryError {
    /// データベース接続に失敗
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// 操作に失敗
    #[error("Operation failed: {0}")]
    OperationFailed(String),
    /// データの取得に失敗
    #[error("Fetch failed: {0}")]
    FetchFailed(String),
    /// 条件付き更新が競合に負けた（何も書き込まれていない）
    #[error("Conflicting update: {0}")]
    Conflict(String),
}

/// イベントリポジトリトレイト
/// イベントディレクトリの永続化を抽象化する
///
/// 残りチケット数は書き込まない。在庫の変更は `BookingRepository` の
/// `reserve` / `cancel` だけが行う
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// 新しいイベントを登録する
    async fn insert(&self, event: &Event) -> Result<(), RepositoryError>;

    /// 説明情報とチケット単価を更新する
    ///
    /// # Returns
    /// * `Ok(false)` - イベントが存在しない
    async fn update_details(&self, event: &Event) -> Result<bool, RepositoryError>;

    /// イベントIDでイベントを検索する
    ///
    /// # Returns
    /// * `Ok(Some(Event))` - イベントが見つかった
    /// * `Ok(None)` - イベントが見つからなかった
    async fn find_by_id(&self, event_id: EventId) -> Result<Option<Event>, RepositoryError>;

    /// すべてのイベントを開催日時の昇順で取得する
    async fn find_all(&self) -> Result<Vec<Event>, RepositoryError>;

    /// 指定された主催者のイベントを開催日時の昇順で取得する
    async fn find_by_organizer(&self, organizer_id: UserId) -> Result<Vec<Event>, RepositoryError>;

    /// 未キャンセルの予約が1件もない場合に限りイベントを削除する
    ///
    /// 予約の有無の確認と削除は1つの原子的な操作として行う
    ///
    /// # Returns
    /// * `Ok(true)` - 削除した
    /// * `Ok(false)` - イベントが存在しない
    /// * `Err(RepositoryError::Conflict)` - 有効な予約が残っている（何も削除されない）
    async fn delete_if_no_active_bookings(
        &self,
        event_id: EventId,
    ) -> Result<bool, RepositoryError>;

    /// 新しい一意のイベントIDを生成する
    fn next_identity(&self) -> EventId;
}

/// 予約リポジトリトレイト
/// 予約の永続化と、それに伴うイベント在庫の原子的な更新を抽象化する
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// 予約を保存し、イベントの残りチケット数を減らす
    ///
    /// 「残りチケット数 >= 予約枚数 の場合のみ減算」と予約の挿入を
    /// 1つのトランザクションとして実行する
    ///
    /// # Returns
    /// * `Ok(())` - 両方の書き込みが成功
    /// * `Err(RepositoryError::Conflict)` - 条件付き減算が一致しなかった（何も書き込まれない）
    async fn reserve(&self, booking: &Booking) -> Result<(), RepositoryError>;

    /// キャンセル済みの予約を保存し、イベントの残りチケット数を戻す
    ///
    /// 「未キャンセルの場合のみステータス更新」と
    /// 「総チケット数を超えない場合のみ加算」を1つのトランザクションとして実行する
    ///
    /// # Returns
    /// * `Err(RepositoryError::Conflict)` - どちらかの条件が一致しなかった（何も書き込まれない）
    async fn cancel(&self, booking: &Booking) -> Result<(), RepositoryError>;

    /// 予約IDで予約を検索する
    async fn find_by_id(&self, booking_id: BookingId) -> Result<Option<Booking>, RepositoryError>;

    /// 指定されたユーザーの予約を作成日時の降順で取得する
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Booking>, RepositoryError>;

    /// 新しい一意の予約IDを生成する
    fn next_identity(&self) -> BookingId;
}

/// ユーザーディレクトリトレイト
/// ユーザープロフィールの参照と管理者による変更を抽象化する
///
/// 登録と認証情報は外部のユーザー管理が扱う
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// ユーザーIDでプロフィールを検索する
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserProfile>, RepositoryError>;

    /// すべてのユーザーを名前の昇順で取得する
    async fn find_all(&self) -> Result<Vec<UserProfile>, RepositoryError>;

    /// 名前・メールアドレス・ロールを更新する
    ///
    /// # Returns
    /// * `Ok(false)` - ユーザーが存在しない
    /// * `Err(RepositoryError::Conflict)` - メールアドレスが他のユーザーと重複している
    async fn update(&self, profile: &UserProfile) -> Result<bool, RepositoryError>;

    /// ユーザーを削除する
    ///
    /// # Returns
    /// * `Ok(false)` - ユーザーが存在しない
    async fn delete(&self, user_id: UserId) -> Result<bool, RepositoryError>;
}
