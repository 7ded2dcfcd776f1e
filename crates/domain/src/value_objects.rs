//! # 値オブジェクト
//!
//! 識別子を持たない不変オブジェクトを定義する。
//!
//! | 型 | 内部表現 | 用途 |
//! |----|---------|------|
//! | [`Version`] | `u32` | 楽観的ロック用のバージョン番号 |
//! | [`StepLevel`] | `u32` | 承認ステップの段階（1 始まり） |
//! | [`Amount`] | `Decimal` | 申請金額（正の値、小数点以下 2 桁まで） |
//! | [`RequestTitle`] | `String` | 申請の件名 |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::DomainError;

// =========================================================================
// Version（バージョン番号）
// =========================================================================

/// バージョン番号（値オブジェクト）
///
/// 申請の楽観的ロックに使用する。1 から始まり、更新のたびに 1 ずつ増える。
///
/// # 不変条件
///
/// - バージョン番号は 1 以上
///
/// # 使用例
///
/// ```rust
/// use shonin_domain::value_objects::Version;
///
/// let v1 = Version::initial();
/// assert_eq!(v1.as_u32(), 1);
///
/// let v2 = v1.next();
/// assert_eq!(v2.as_u32(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(u32);

impl Version {
    /// 初期バージョン（1）を作成する
    pub fn initial() -> Self {
        Self(1)
    }

    /// 指定した値からバージョンを作成する
    ///
    /// # エラー
    ///
    /// 0 の場合は `DomainError::Validation` を返す。
    pub fn new(value: u32) -> Result<Self, DomainError> {
        if value == 0 {
            return Err(DomainError::Validation(
                "バージョン番号は 1 以上である必要があります".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// 次のバージョンを返す
    ///
    /// # パニック
    ///
    /// u32 の最大値を超える場合はパニックする。実運用では到達しない想定。
    pub fn next(&self) -> Self {
        Self(
            self.0
                .checked_add(1)
                .expect("バージョン番号がオーバーフローしました"),
        )
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// i32 に変換する（DB 互換用）
    ///
    /// # パニック
    ///
    /// i32 の範囲を超える場合はパニックする。
    pub fn as_i32(&self) -> i32 {
        i32::try_from(self.0).expect("バージョン番号が i32 の範囲を超えています")
    }
}

impl TryFrom<i32> for Version {
    type Error = DomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(DomainError::Validation(
                "バージョン番号は 1 以上である必要があります".to_string(),
            ));
        }
        Ok(Self(value as u32))
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::initial()
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

// =========================================================================
// StepLevel（承認ステップの段階）
// =========================================================================

/// 承認ステップの段階（値オブジェクト）
///
/// ワークフロー内のステップは 1 から連続する段階番号を持つ。
/// 申請の `current_step` もこの型で表現し、最終段階の承認後は
/// 「最終段階 + 1」を指す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepLevel(u32);

impl StepLevel {
    /// 最初の段階（1）
    pub fn initial() -> Self {
        Self(1)
    }

    pub fn new(value: u32) -> Result<Self, DomainError> {
        if value == 0 {
            return Err(DomainError::Validation(
                "ステップ段階は 1 以上である必要があります".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// 次の段階を返す
    ///
    /// # パニック
    ///
    /// u32 の最大値を超える場合はパニックする。
    pub fn next(&self) -> Self {
        Self(
            self.0
                .checked_add(1)
                .expect("ステップ段階がオーバーフローしました"),
        )
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// i32 に変換する（DB 互換用）
    ///
    /// # パニック
    ///
    /// i32 の範囲を超える場合はパニックする。
    pub fn as_i32(&self) -> i32 {
        i32::try_from(self.0).expect("ステップ段階が i32 の範囲を超えています")
    }
}

impl TryFrom<i32> for StepLevel {
    type Error = DomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(DomainError::Validation(
                "ステップ段階は 1 以上である必要があります".to_string(),
            ));
        }
        Ok(Self(value as u32))
    }
}

impl std::fmt::Display for StepLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =========================================================================
// Amount（申請金額）
// =========================================================================

/// 申請金額（値オブジェクト）
///
/// DB の `NUMERIC(15, 2)` に収まる正の十進数。
///
/// # 不変条件
///
/// - 0 より大きい
/// - 小数点以下は 2 桁まで
/// - 整数部は 13 桁まで
///
/// ```rust
/// use rust_decimal::Decimal;
/// use shonin_domain::value_objects::Amount;
///
/// let amount = Amount::new(Decimal::new(2_000_000, 0)).unwrap();
/// assert_eq!(amount.as_decimal(), Decimal::new(2_000_000, 0));
/// assert!(Amount::new(Decimal::ZERO).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Amount(Decimal);

impl Amount {
    const MAX_SCALE: u32 = 2;

    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::Validation(
                "金額は 0 より大きい必要があります".to_string(),
            ));
        }
        if value.normalize().scale() > Self::MAX_SCALE {
            return Err(DomainError::Validation(format!(
                "金額は小数点以下 {} 桁までです",
                Self::MAX_SCALE
            )));
        }
        if value >= Decimal::new(10_000_000_000_000, 0) {
            return Err(DomainError::Validation(
                "金額が上限を超えています".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =========================================================================
// RequestTitle（申請件名）
// =========================================================================

define_validated_string! {
    /// 申請件名（値オブジェクト）
    ///
    /// 前後の空白を除去し、空文字列と 255 文字超を拒否する。
    pub struct RequestTitle {
        label: "件名",
        max_length: 255,
    }
}
