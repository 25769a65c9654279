//! Protocol message types

/// Request (client → server)
#[derive(Clone, PartialEq, Eq)]
pub enum Request {
    /// Simple BindRequest
    Bind {
        /// Protocol version
        version: i32,
        /// Bind DN (empty for anonymous)
        name: String,
        /// Simple password
        password: String,
    },

    /// ExtendedRequest for StartTLS
    StartTls,

    /// UnbindRequest
    Unbind,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Request::Bind { version, name, .. } => f
                .debug_struct("Bind")
                .field("version", version)
                .field("name", name)
                .field("password", &"***REDACTED***")
                .finish(),
            Request::StartTls => f.write_str("StartTls"),
            Request::Unbind => f.write_str("Unbind"),
        }
    }
}

/// Components shared by every LDAP response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LdapResult {
    /// Result code
    pub code: u32,
    /// Matched DN
    pub matched_dn: String,
    /// Diagnostic message
    pub message: String,
}

impl LdapResult {
    /// Whether the operation succeeded
    pub fn is_success(&self) -> bool {
        self.code == super::constants::result_code::SUCCESS
    }
}

/// Protocol operation carried by a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// BindResponse
    Bind(LdapResult),

    /// ExtendedResponse
    Extended {
        /// Result components
        result: LdapResult,
        /// Response OID, if the server sent one
        name: Option<String>,
    },

    /// Any operation this crate does not interpret
    Other {
        /// BER tag of the operation
        tag: u8,
    },
}

/// A decoded LDAPMessage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMessage {
    /// Message ID (0 for unsolicited notifications)
    pub message_id: i32,
    /// Protocol operation
    pub response: Response,
}
