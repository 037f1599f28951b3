use crate::error::RouterError;

/// HTTPメソッドのenum
/// 現行のHTTP/1.1の仕様に準拠
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// GETメソッド
    GET,

    /// POSTメソッド
    POST,

    /// HEADメソッド
    HEAD,

    /// PUTメソッド
    PUT,

    /// DELETEメソッド
    DELETE,

    /// OPTIONSメソッド
    OPTIONS,

    /// TRACEメソッド
    TRACE,

    /// CONNECTメソッド
    CONNECT,

    /// PATCHメソッド
    PATCH,

    /// カスタム
    UNKNOWN(String),
}

impl Method {
    /// 文字列からMethodを取得する
    #[inline]
    pub fn from_str(method: &str) -> Method {
        match method {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "HEAD" => Method::HEAD,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "OPTIONS" => Method::OPTIONS,
            "TRACE" => Method::TRACE,
            "CONNECT" => Method::CONNECT,
            "PATCH" => Method::PATCH,
            method => Method::UNKNOWN(method.to_string()),
        }
    }

    /// Validate a method token and normalize it to uppercase.
    ///
    /// メソッドトークンを検証し、大文字に正規化して取得する
    #[inline]
    pub fn from_token(token: &str) -> Result<Method, RouterError> {
        if !Method::is_valid_token(token) {
            return Err(RouterError::InvalidMethod(token.to_string()));
        }
        Ok(Method::from_str(&token.to_uppercase()))
    }

    #[inline]
    pub fn to_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::HEAD => "HEAD",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::OPTIONS => "OPTIONS",
            Method::TRACE => "TRACE",
            Method::CONNECT => "CONNECT",
            Method::PATCH => "PATCH",
            Method::UNKNOWN(method) => method,
        }
    }

    /// RFC 7230 の tchar 以外を含むトークンは拒否する
    #[inline]
    pub fn is_valid_token(token: &str) -> bool {
        !token.is_empty()
            && token.bytes().all(|b| {
                matches!(b,
                    b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+'
                    | b'.' | b'^' | b'_' | b'`' | b'|' | b'~' | b'-'
                    | b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z')
            })
    }
}

impl std::fmt::Display for Method {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}
