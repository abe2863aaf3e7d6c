/// Portal API routes known to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Register,
    Verify,
    Login,
    ExamCountdown,
    UserStats,
}

impl Endpoint {
    /// Routes reachable without a session. These never carry a credential.
    pub const PUBLIC: [Endpoint; 3] = [Endpoint::Register, Endpoint::Verify, Endpoint::Login];

    pub fn is_public(self) -> bool {
        Self::PUBLIC.contains(&self)
    }

    /// Whether requests to this route carry the session credential.
    ///
    /// The exam countdown is served without authorization, but it is not on
    /// the public list: a 401 from it still invalidates the session.
    pub fn sends_credential(self) -> bool {
        !self.is_public() && self != Endpoint::ExamCountdown
    }

    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Register => "register",
            Endpoint::Verify => "verify",
            Endpoint::Login => "login",
            Endpoint::ExamCountdown => "exam_countdown",
            Endpoint::UserStats => "user_stats",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_endpoints_never_send_credential() {
        for endpoint in Endpoint::PUBLIC {
            assert!(endpoint.is_public());
            assert!(!endpoint.sends_credential(), "{}", endpoint.name());
        }
    }

    #[test]
    fn test_protected_endpoints() {
        assert!(!Endpoint::UserStats.is_public());
        assert!(Endpoint::UserStats.sends_credential());
        assert!(!Endpoint::ExamCountdown.is_public());
        assert!(!Endpoint::ExamCountdown.sends_credential());
    }
}
