//! # レビュー
//!
//! ツアーに対するレビューエンティティと評価値オブジェクトを定義する。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DomainError, tour::TourId, user::UserId};

define_uuid_id! {
    /// レビュー ID（一意識別子）
    pub struct ReviewId;
}

/// 評価（値オブジェクト）
///
/// 1〜5 の整数。生成時にバリデーションを実行する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating(i16);

impl Rating {
    /// 評価の最小値
    const MIN: i16 = 1;
    /// 評価の最大値
    const MAX: i16 = 5;

    /// 評価を作成する
    ///
    /// # エラー
    ///
    /// 1〜5 の範囲外の場合は `DomainError::Validation` を返す。
    pub fn new(value: i16) -> Result<Self, DomainError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(DomainError::Validation(format!(
                "評価は {} から {} の整数である必要があります",
                Self::MIN,
                Self::MAX
            )));
        }

        Ok(Self(value))
    }

    /// 内部の整数値を取得する
    pub fn as_i16(&self) -> i16 {
        self.0
    }
}

/// レビュー本文（値オブジェクト）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewBody(String);

impl ReviewBody {
    /// 本文の最大文字数
    const MAX_LENGTH: usize = 1000;

    /// レビュー本文を作成する
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "レビュー本文は必須です".to_string(),
            ));
        }

        if value.chars().count() > Self::MAX_LENGTH {
            return Err(DomainError::Validation(format!(
                "レビュー本文は {} 文字以内である必要があります",
                Self::MAX_LENGTH
            )));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// レビューエンティティ
///
/// # 不変条件
///
/// - `tour_id` / `user_id` は存在するエンティティを参照する
/// - `rating` は 1〜5
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    id: ReviewId,
    tour_id: TourId,
    user_id: UserId,
    body: ReviewBody,
    rating: Rating,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Review {
    /// 新しいレビューを作成する
    pub fn new(
        id: ReviewId,
        tour_id: TourId,
        user_id: UserId,
        body: ReviewBody,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tour_id,
            user_id,
            body,
            rating,
            created_at: now,
            updated_at: now,
        }
    }

    /// データベースの行からレビューを復元する
    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        id: ReviewId,
        tour_id: TourId,
        user_id: UserId,
        body: ReviewBody,
        rating: Rating,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tour_id,
            user_id,
            body,
            rating,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &ReviewId {
        &self.id
    }

    pub fn tour_id(&self) -> &TourId {
        &self.tour_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn body(&self) -> &ReviewBody {
        &self.body
    }

    pub fn rating(&self) -> Rating {
        self.rating
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

    // ===== Rating テスト =====

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(5)]
    fn test_rating_範囲内の値を受け付ける(#[case] value: i16) {
        assert_eq!(Rating::new(value).unwrap().as_i16(), value);
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[case(-1)]
    fn test_rating_範囲外の値を拒否する(#[case] value: i16) {
        assert!(Rating::new(value).is_err());
    }

    // ===== ReviewBody テスト =====

    #[test]
    fn test_review_body_空文字を拒否する() {
        assert!(ReviewBody::new("").is_err());
        assert!(ReviewBody::new("   ").is_err());
    }

    #[test]
    fn test_review_body_有効な本文を受け付ける() {
        let body = ReviewBody::new("景色が素晴らしかった").unwrap();
        assert_eq!(body.as_str(), "景色が素晴らしかった");
    }
}
