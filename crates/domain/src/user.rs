//! # ユーザー
//!
//! ユーザーエンティティとそれに関連する値オブジェクトを定義する。
//!
//! 認証・認可はこのサービスの範囲外であり、ユーザーは
//! レビューの投稿者・ツアーの参加者を表すリソースとしてのみ扱う。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::DomainError;

define_uuid_id! {
    /// ユーザー ID（一意識別子）
    pub struct UserId;
}

/// メールアドレス（値オブジェクト）
///
/// 生成時にバリデーションを実行し、不正な値の作成を防ぐ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - `local@domain` の形式であること
    /// - 最大 255 文字
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        };

        if local.is_empty() || domain.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        }

        if value.len() > 255 {
            return Err(DomainError::Validation(
                "メールアドレスは255文字以内である必要があります".to_string(),
            ));
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

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ユーザー表示名（値オブジェクト）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserName(String);

impl UserName {
    /// 表示名の最大文字数
    const MAX_LENGTH: usize = 100;

    /// 表示名を作成する
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation("表示名は必須です".to_string()));
        }

        if value.chars().count() > Self::MAX_LENGTH {
            return Err(DomainError::Validation(format!(
                "表示名は {} 文字以内である必要があります",
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

impl std::fmt::Display for UserName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ユーザー区分
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum UserRole {
    /// 一般ユーザー
    User,
    /// ガイド
    Guide,
    /// リードガイド
    LeadGuide,
    /// 管理者
    Admin,
}

impl std::str::FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "guide" => Ok(Self::Guide),
            "lead-guide" => Ok(Self::LeadGuide),
            "admin" => Ok(Self::Admin),
            _ => Err(DomainError::Validation(format!(
                "不正なユーザー区分: {}",
                s
            ))),
        }
    }
}

/// ユーザーの部分更新パラメータ
///
/// `None` のフィールドは「変更しない」を意味する。
#[derive(Debug, Default)]
pub struct UserUpdate {
    pub name:   Option<UserName>,
    pub email:  Option<Email>,
    pub role:   Option<UserRole>,
    pub active: Option<bool>,
}

/// ユーザーエンティティ
///
/// # 不変条件
///
/// - `email` はシステム内で一意
/// - `active` が false のユーザーは一覧に表示されない
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    name: UserName,
    email: Email,
    role: UserRole,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// 新しいユーザーを作成する
    ///
    /// # 不変条件
    ///
    /// - 作成時は `active = true`
    pub fn new(
        id: UserId,
        name: UserName,
        email: Email,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            role,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// データベースの行からユーザーを復元する
    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        id: UserId,
        name: UserName,
        email: Email,
        role: UserRole,
        active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            role,
            active,
            created_at,
            updated_at,
        }
    }

    /// ユーザー情報を部分更新する
    ///
    /// `None` のフィールドは変更しない。`updated_at` は `now` に更新される。
    pub fn apply_update(&mut self, update: UserUpdate, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(role) = update.role {
            self.role = role;
        }
        if let Some(active) = update.active {
            self.active = active;
        }
        self.updated_at = now;
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &UserName {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn is_active(&self) -> bool {
        self.active
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

    // ===== Email テスト =====

    #[test]
    fn test_email_有効なアドレスを受け付ける() {
        let email = Email::new("user@example.com").unwrap();
        assert_eq!(email.as_str(), "user@example.com");
    }

    #[rstest]
    #[case("")]
    #[case("no-at-sign")]
    #[case("@example.com")]
    #[case("user@")]
    fn test_email_不正な形式を拒否する(#[case] value: &str) {
        assert!(Email::new(value).is_err());
    }

    // ===== UserRole テスト =====

    #[rstest]
    #[case("user", UserRole::User)]
    #[case("guide", UserRole::Guide)]
    #[case("lead-guide", UserRole::LeadGuide)]
    #[case("admin", UserRole::Admin)]
    fn test_user_role_文字列からパースできる(#[case] input: &str, #[case] expected: UserRole) {
        assert_eq!(input.parse::<UserRole>().unwrap(), expected);
    }

    #[test]
    fn test_user_role_display表現がkebab_caseになる() {
        assert_eq!(UserRole::LeadGuide.to_string(), "lead-guide");
    }

    // ===== User テスト =====

    #[test]
    fn test_new_で作成したユーザーはアクティブ() {
        let user = User::new(
            UserId::new(),
            UserName::new("山田太郎").unwrap(),
            Email::new("taro@example.com").unwrap(),
            UserRole::User,
            chrono::Utc::now(),
        );

        assert!(user.is_active());
    }
}
