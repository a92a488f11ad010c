/// ドメイン層のエラー型
/// ビジネスルール違反を表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// 無効な数量（0以下、整数でない、範囲外）
    #[error("Invalid quantity. It must be a positive integer.")]
    InvalidQuantity,
    /// 残りチケット数が不足している
    #[error("Not enough tickets available")]
    InsufficientInventory,
    /// 既にキャンセル済みの予約をキャンセルしようとした
    #[error("Booking is already canceled")]
    AlreadyCanceled,
    /// 在庫を戻すと総チケット数を超えてしまう
    #[error("Releasing {requested} tickets would exceed the total of {total}")]
    InventoryOverflow { requested: u32, total: u32 },
    /// 金額の計算でオーバーフローが発生した
    #[error("Price calculation overflowed")]
    PriceOverflow,
    /// 無効な値
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
