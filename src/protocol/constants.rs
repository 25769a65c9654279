//! LDAPv3 protocol constants

/// Protocol version sent in BindRequest
pub const LDAP_VERSION: i32 = 3;

/// StartTLS extended operation (RFC 4511 §4.14)
pub const STARTTLS_OID: &str = "1.3.6.1.4.1.1466.20037";

/// BER tags
pub mod tags {
    /// Universal BOOLEAN
    pub const BOOLEAN: u8 = 0x01;

    /// Universal INTEGER
    pub const INTEGER: u8 = 0x02;

    /// Universal OCTET STRING
    pub const OCTET_STRING: u8 = 0x04;

    /// Universal ENUMERATED
    pub const ENUMERATED: u8 = 0x0A;

    /// Universal SEQUENCE (constructed)
    pub const SEQUENCE: u8 = 0x30;

    /// [APPLICATION 0] BindRequest
    pub const BIND_REQUEST: u8 = 0x60;

    /// [APPLICATION 1] BindResponse
    pub const BIND_RESPONSE: u8 = 0x61;

    /// [APPLICATION 2] UnbindRequest (primitive NULL)
    pub const UNBIND_REQUEST: u8 = 0x42;

    /// [APPLICATION 23] ExtendedRequest
    pub const EXTENDED_REQUEST: u8 = 0x77;

    /// [APPLICATION 24] ExtendedResponse
    pub const EXTENDED_RESPONSE: u8 = 0x78;

    /// [0] simple authentication inside BindRequest
    pub const AUTH_SIMPLE: u8 = 0x80;

    /// [0] requestName inside ExtendedRequest
    pub const EXTENDED_REQUEST_NAME: u8 = 0x80;

    /// [10] responseName inside ExtendedResponse
    pub const EXTENDED_RESPONSE_NAME: u8 = 0x8A;
}

/// Result codes (RFC 4511 §4.1.9)
pub mod result_code {
    /// Operation completed
    pub const SUCCESS: u32 = 0;

    /// Server is unwilling to continue (e.g. StartTLS on an encrypted link)
    pub const OPERATIONS_ERROR: u32 = 1;

    /// Malformed request
    pub const PROTOCOL_ERROR: u32 = 2;

    /// Authentication method not supported
    pub const AUTH_METHOD_NOT_SUPPORTED: u32 = 7;

    /// Stronger authentication required
    pub const STRONGER_AUTH_REQUIRED: u32 = 8;

    /// Bind DN or password rejected
    pub const INVALID_CREDENTIALS: u32 = 49;

    /// Server refuses to perform the operation
    pub const UNWILLING_TO_PERFORM: u32 = 53;
}
