//! # ツアー
//!
//! ツアーエンティティとそれに関連する値オブジェクトを定義する。
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: TourId は UUID をラップし、型安全性を確保
//! - **不変性**: エンティティフィールドは基本的に不変、変更はメソッド経由
//! - **バリデーション**: 値オブジェクトの生成時に検証ロジックを実行

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::DomainError;

define_uuid_id! {
    /// ツアー ID（一意識別子）
    ///
    /// UUID v7 を使用し、生成順にソート可能。
    pub struct TourId;
}

/// ツアー名（値オブジェクト）
///
/// 10 文字以上 40 文字以内を要求する。
/// 生成時にバリデーションを実行し、不正な値の作成を防ぐ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourName(String);

impl TourName {
    /// ツアー名の最小文字数
    const MIN_LENGTH: usize = 10;
    /// ツアー名の最大文字数
    const MAX_LENGTH: usize = 40;

    /// ツアー名を作成する
    ///
    /// # エラー
    ///
    /// 空・10 文字未満・40 文字超のいずれかの場合は
    /// `DomainError::Validation` を返す。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation("ツアー名は必須です".to_string()));
        }

        let length = value.chars().count();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&length) {
            return Err(DomainError::Validation(format!(
                "ツアー名は {} 文字以上 {} 文字以内である必要があります",
                Self::MIN_LENGTH,
                Self::MAX_LENGTH
            )));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for TourName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ツアー難易度
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    /// 初心者向け
    Easy,
    /// 中級者向け
    Medium,
    /// 上級者向け
    Difficult,
}

impl std::str::FromStr for Difficulty {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "difficult" => Ok(Self::Difficult),
            _ => Err(DomainError::Validation(format!("不正な難易度: {}", s))),
        }
    }
}

/// ツアーの部分更新パラメータ
///
/// `None` のフィールドは「変更しない」を意味する。
#[derive(Debug, Default)]
pub struct TourUpdate {
    pub name: Option<TourName>,
    pub duration_days: Option<i32>,
    pub max_group_size: Option<i32>,
    pub difficulty: Option<Difficulty>,
    pub price: Option<f64>,
    pub summary: Option<String>,
}

/// ツアーエンティティ
///
/// 販売中のツアー商品を表現する。レビューの集計値
/// （`ratings_average` / `ratings_quantity`）はレビュー登録時に更新される。
///
/// # 不変条件
///
/// - `duration_days`, `max_group_size`, `price` は正の値
/// - `ratings_average` は 1.0〜5.0
#[derive(Debug, Clone, PartialEq)]
pub struct Tour {
    id: TourId,
    name: TourName,
    duration_days: i32,
    max_group_size: i32,
    difficulty: Difficulty,
    price: f64,
    summary: Option<String>,
    ratings_average: f64,
    ratings_quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Tour {
    /// レビューがまだ無いツアーの平均評価の初期値
    const DEFAULT_RATINGS_AVERAGE: f64 = 4.5;

    /// 新しいツアーを作成する
    ///
    /// # 不変条件
    ///
    /// - `ratings_average` は初期値 4.5、`ratings_quantity` は 0
    ///
    /// # エラー
    ///
    /// 数値フィールドが不変条件に違反する場合は `DomainError::Validation` を返す。
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TourId,
        name: TourName,
        duration_days: i32,
        max_group_size: i32,
        difficulty: Difficulty,
        price: f64,
        summary: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if duration_days <= 0 {
            return Err(DomainError::Validation(
                "ツアー日数は正の値である必要があります".to_string(),
            ));
        }
        if max_group_size <= 0 {
            return Err(DomainError::Validation(
                "最大グループ人数は正の値である必要があります".to_string(),
            ));
        }
        if price <= 0.0 {
            return Err(DomainError::Validation(
                "価格は正の値である必要があります".to_string(),
            ));
        }

        Ok(Self {
            id,
            name,
            duration_days,
            max_group_size,
            difficulty,
            price,
            summary,
            ratings_average: Self::DEFAULT_RATINGS_AVERAGE,
            ratings_quantity: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// データベースの行からツアーを復元する
    ///
    /// 永続化済みの値を信頼し、数値フィールドの再検証は行わない。
    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        id: TourId,
        name: TourName,
        duration_days: i32,
        max_group_size: i32,
        difficulty: Difficulty,
        price: f64,
        summary: Option<String>,
        ratings_average: f64,
        ratings_quantity: i32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            duration_days,
            max_group_size,
            difficulty,
            price,
            summary,
            ratings_average,
            ratings_quantity,
            created_at,
            updated_at,
        }
    }

    /// ツアー情報を部分更新する
    ///
    /// `None` のフィールドは変更しない。`updated_at` は `now` に更新される。
    ///
    /// # エラー
    ///
    /// 数値フィールドが不変条件に違反する場合は `DomainError::Validation` を返す。
    pub fn apply_update(&mut self, update: TourUpdate, now: DateTime<Utc>) -> Result<(), DomainError> {
        if let Some(duration_days) = update.duration_days
            && duration_days <= 0
        {
            return Err(DomainError::Validation(
                "ツアー日数は正の値である必要があります".to_string(),
            ));
        }
        if let Some(max_group_size) = update.max_group_size
            && max_group_size <= 0
        {
            return Err(DomainError::Validation(
                "最大グループ人数は正の値である必要があります".to_string(),
            ));
        }
        if let Some(price) = update.price
            && price <= 0.0
        {
            return Err(DomainError::Validation(
                "価格は正の値である必要があります".to_string(),
            ));
        }

        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(duration_days) = update.duration_days {
            self.duration_days = duration_days;
        }
        if let Some(max_group_size) = update.max_group_size {
            self.max_group_size = max_group_size;
        }
        if let Some(difficulty) = update.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(summary) = update.summary {
            self.summary = Some(summary);
        }
        self.updated_at = now;

        Ok(())
    }

    /// レビュー集計値を更新する
    pub fn set_ratings(&mut self, average: f64, quantity: i32, now: DateTime<Utc>) {
        self.ratings_average = average;
        self.ratings_quantity = quantity;
        self.updated_at = now;
    }

    pub fn id(&self) -> &TourId {
        &self.id
    }

    pub fn name(&self) -> &TourName {
        &self.name
    }

    pub fn duration_days(&self) -> i32 {
        self.duration_days
    }

    pub fn max_group_size(&self) -> i32 {
        self.max_group_size
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn ratings_average(&self) -> f64 {
        self.ratings_average
    }

    pub fn ratings_quantity(&self) -> i32 {
        self.ratings_quantity
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn valid_name() -> TourName {
        TourName::new("The Forest Hiker").unwrap()
    }

    // ===== TourName テスト =====

    #[test]
    fn test_tour_name_有効な名前を受け付ける() {
        let name = TourName::new("The Forest Hiker").unwrap();
        assert_eq!(name.as_str(), "The Forest Hiker");
    }

    #[test]
    fn test_tour_name_前後の空白をトリムする() {
        let name = TourName::new("  The Forest Hiker  ").unwrap();
        assert_eq!(name.as_str(), "The Forest Hiker");
    }

    #[rstest]
    #[case("")]
    #[case("short")]
    #[case("このツアー名は四十文字の上限をはるかに超えてしまうほど長い名前なのでバリデーションに失敗する")]
    fn test_tour_name_不正な長さを拒否する(#[case] value: &str) {
        assert!(TourName::new(value).is_err());
    }

    // ===== Difficulty テスト =====

    #[rstest]
    #[case("easy", Difficulty::Easy)]
    #[case("medium", Difficulty::Medium)]
    #[case("difficult", Difficulty::Difficult)]
    fn test_difficulty_文字列からパースできる(#[case] input: &str, #[case] expected: Difficulty) {
        assert_eq!(input.parse::<Difficulty>().unwrap(), expected);
    }

    #[test]
    fn test_difficulty_不正な値を拒否する() {
        assert!("extreme".parse::<Difficulty>().is_err());
    }

    // ===== Tour テスト =====

    #[test]
    fn test_new_で初期の評価値が設定される() {
        let tour = Tour::new(
            TourId::new(),
            valid_name(),
            5,
            25,
            Difficulty::Easy,
            397.0,
            None,
            chrono::Utc::now(),
        )
        .unwrap();

        assert_eq!(tour.ratings_average(), 4.5);
        assert_eq!(tour.ratings_quantity(), 0);
    }

    #[test]
    fn test_apply_update_が指定フィールドのみ変更する() {
        let now = chrono::Utc::now();
        let mut tour = Tour::new(
            TourId::new(),
            valid_name(),
            5,
            25,
            Difficulty::Easy,
            397.0,
            None,
            now,
        )
        .unwrap();

        tour.apply_update(
            TourUpdate {
                price: Some(497.0),
                ..TourUpdate::default()
            },
            now,
        )
        .unwrap();

        assert_eq!(tour.price(), 497.0);
        assert_eq!(tour.duration_days(), 5);
        assert_eq!(tour.difficulty(), Difficulty::Easy);
    }

    #[test]
    fn test_apply_update_が不正な価格を拒否する() {
        let now = chrono::Utc::now();
        let mut tour = Tour::new(
            TourId::new(),
            valid_name(),
            5,
            25,
            Difficulty::Easy,
            397.0,
            None,
            now,
        )
        .unwrap();

        let result = tour.apply_update(
            TourUpdate {
                price: Some(-10.0),
                ..TourUpdate::default()
            },
            now,
        );

        assert!(result.is_err());
        // 失敗時は変更されない
        assert_eq!(tour.price(), 397.0);
    }

    #[rstest]
    #[case(0, 25, 397.0)]
    #[case(5, 0, 397.0)]
    #[case(5, 25, 0.0)]
    #[case(5, 25, -1.0)]
    fn test_new_が不正な数値を拒否する(
        #[case] duration: i32,
        #[case] group_size: i32,
        #[case] price: f64,
    ) {
        let result = Tour::new(
            TourId::new(),
            valid_name(),
            duration,
            group_size,
            Difficulty::Easy,
            price,
            None,
            chrono::Utc::now(),
        );

        assert!(result.is_err());
    }
}
