//! Request bodies for registration, SMS verification and login.

use serde::{Deserialize, Serialize};

/// Registration form submitted to the public register endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub firstname: String,
    pub lastname: String,
    pub class_name: String,
    pub language: String,
    pub phone_number: String,
    pub password: String,
}

/// SMS verification of a freshly registered phone number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub phone_number: String,
    pub sms_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub phone_number: String,
    pub password: String,
}

/// Wire body for requests whose backend also looks the account up by `username`.
/// The phone number doubles as the username.
#[derive(Debug, Serialize)]
pub(crate) struct WithUsername<'a, T: Serialize> {
    #[serde(flatten)]
    pub request: &'a T,
    pub username: &'a str,
}

impl RegisterRequest {
    pub(crate) fn wire_body(&self) -> WithUsername<'_, Self> {
        WithUsername {
            request: self,
            username: &self.phone_number,
        }
    }
}

impl LoginRequest {
    pub(crate) fn wire_body(&self) -> WithUsername<'_, Self> {
        WithUsername {
            request: self,
            username: &self.phone_number,
        }
    }
}
