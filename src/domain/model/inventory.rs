use crate::domain::error::DomainError;
use crate::domain::model::TicketQuantity;
use serde::{Deserialize, Serialize};

/// チケット在庫
/// イベントの総チケット数と残りチケット数を管理する
///
/// 不変条件: `0 <= remaining <= total` かつ `total > 0`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketInventory {
    total: u32,
    remaining: u32,
}

impl TicketInventory {
    /// 新しい在庫を作成
    /// 残りチケット数は総チケット数と同じ
    ///
    /// # Arguments
    /// * `total` - 総チケット数（1以上）
    pub fn new(total: u32) -> Result<Self, DomainError> {
        if total == 0 {
            return Err(DomainError::InvalidValue(
                "総チケット数は1以上である必要があります".to_string(),
            ));
        }
        Ok(Self {
            total,
            remaining: total,
        })
    }

    /// 永続化されたデータから在庫を再構築
    ///
    /// # Returns
    /// * `Err(DomainError::InvalidValue)` - 不変条件を満たさない
    pub fn reconstruct(total: u32, remaining: u32) -> Result<Self, DomainError> {
        if total == 0 || remaining > total {
            return Err(DomainError::InvalidValue(format!(
                "在庫データが不正です: total={}, remaining={}",
                total, remaining
            )));
        }
        Ok(Self { total, remaining })
    }

    /// 総チケット数を取得
    pub fn total(&self) -> u32 {
        self.total
    }

    /// 残りチケット数を取得
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// チケットを予約する
    ///
    /// # Arguments
    /// * `quantity` - 予約する枚数
    ///
    /// # Returns
    /// * `Ok(())` - 予約成功
    /// * `Err(DomainError::InsufficientInventory)` - 在庫不足
    pub fn reserve(&mut self, quantity: TicketQuantity) -> Result<(), DomainError> {
        if !self.has_available(quantity) {
            return Err(DomainError::InsufficientInventory);
        }
        self.remaining -= quantity.value();
        Ok(())
    }

    /// チケットを解放する（キャンセル時）
    ///
    /// # Arguments
    /// * `quantity` - 解放する枚数
    ///
    /// # Returns
    /// * `Err(DomainError::InventoryOverflow)` - 総チケット数を超える
    pub fn release(&mut self, quantity: TicketQuantity) -> Result<(), DomainError> {
        let released = self
            .remaining
            .checked_add(quantity.value())
            .filter(|released| *released <= self.total)
            .ok_or(DomainError::InventoryOverflow {
                requested: quantity.value(),
                total: self.total,
            })?;
        self.remaining = released;
        Ok(())
    }

    /// 指定された枚数が予約可能かチェック
    pub fn has_available(&self, quantity: TicketQuantity) -> bool {
        self.remaining >= quantity.value()
    }
}
