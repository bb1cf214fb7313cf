//! HTTP challenge-response authentication
//!
//! Cameras answer the first (anonymous) request with `401` and one or more
//! `WWW-Authenticate` challenges. Digest is answered per RFC 7616 (MD5 and
//! SHA-256, with or without `-sess`); Basic is accepted as a fallback.

use md5::{Digest, Md5};
use sha2::Sha256;

use crate::error::{ArchiveError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Md5,
    Md5Sess,
    Sha256,
    Sha256Sess,
}

impl Algorithm {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "MD5" => Some(Self::Md5),
            "MD5-SESS" => Some(Self::Md5Sess),
            "SHA-256" => Some(Self::Sha256),
            "SHA-256-SESS" => Some(Self::Sha256Sess),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Md5Sess => "MD5-sess",
            Self::Sha256 => "SHA-256",
            Self::Sha256Sess => "SHA-256-sess",
        }
    }

    fn is_sess(&self) -> bool {
        matches!(self, Self::Md5Sess | Self::Sha256Sess)
    }

    fn hash(&self, data: &str) -> String {
        match self {
            Self::Md5 | Self::Md5Sess => format!("{:x}", Md5::digest(data.as_bytes())),
            Self::Sha256 | Self::Sha256Sess => format!("{:x}", Sha256::digest(data.as_bytes())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub opaque: Option<String>,
    /// selected qop ("auth" preferred over "auth-int"); None for legacy RFC 2069
    pub qop: Option<String>,
    pub algorithm: Algorithm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    Digest(DigestChallenge),
    Basic,
}

impl Challenge {
    /// Pick the strongest supported challenge from every `WWW-Authenticate` value.
    pub fn select<'a>(headers: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut basic = false;
        let mut unsupported = Vec::new();

        for header in headers {
            for (scheme, params) in split_challenges(header) {
                match scheme.to_ascii_lowercase().as_str() {
                    "digest" => match DigestChallenge::from_params(&params) {
                        Ok(d) => return Ok(Challenge::Digest(d)),
                        Err(reason) => unsupported.push(reason),
                    },
                    "basic" => basic = true,
                    other => unsupported.push(format!("scheme {other}")),
                }
            }
        }

        if basic {
            return Ok(Challenge::Basic);
        }
        Err(ArchiveError::Auth(if unsupported.is_empty() {
            "401 without a WWW-Authenticate challenge".to_string()
        } else {
            format!("no supported challenge ({})", unsupported.join(", "))
        }))
    }
}

impl DigestChallenge {
    fn from_params(params: &[(String, String)]) -> std::result::Result<Self, String> {
        let get = |k: &str| {
            params
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(k))
                .map(|(_, v)| v.clone())
        };

        let algorithm = match get("algorithm") {
            Some(a) => Algorithm::parse(&a).ok_or_else(|| format!("digest algorithm {a}"))?,
            None => Algorithm::Md5,
        };
        let qop = match get("qop") {
            Some(list) => {
                let offered: Vec<&str> = list.split(',').map(str::trim).collect();
                if offered.iter().any(|q| q.eq_ignore_ascii_case("auth")) {
                    Some("auth".to_string())
                } else if offered.iter().any(|q| q.eq_ignore_ascii_case("auth-int")) {
                    Some("auth-int".to_string())
                } else {
                    return Err(format!("digest qop {list}"));
                }
            }
            None => None,
        };

        Ok(Self {
            realm: get("realm").unwrap_or_default(),
            nonce: get("nonce").ok_or_else(|| "digest challenge without nonce".to_string())?,
            opaque: get("opaque"),
            qop,
            algorithm,
        })
    }

    /// `Authorization` header value for one request.
    pub fn authorization(
        &self,
        method: &str,
        uri: &str,
        username: &str,
        password: &str,
        cnonce: &str,
        nc: u32,
    ) -> String {
        let alg = self.algorithm;
        let nc = format!("{nc:08x}");

        let mut ha1 = alg.hash(&format!("{username}:{}:{password}", self.realm));
        if alg.is_sess() {
            ha1 = alg.hash(&format!("{ha1}:{}:{cnonce}", self.nonce));
        }
        let ha2 = match self.qop.as_deref() {
            // GET carries no entity body
            Some("auth-int") => alg.hash(&format!("{method}:{uri}:{}", alg.hash(""))),
            _ => alg.hash(&format!("{method}:{uri}")),
        };
        let response = match self.qop.as_deref() {
            Some(qop) => alg.hash(&format!("{ha1}:{}:{nc}:{cnonce}:{qop}:{ha2}", self.nonce)),
            None => alg.hash(&format!("{ha1}:{}:{ha2}", self.nonce)),
        };

        let mut header = format!(
            "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", algorithm={}, response=\"{}\"",
            quote(username),
            quote(&self.realm),
            quote(&self.nonce),
            quote(uri),
            alg.as_str(),
            response
        );
        if let Some(qop) = &self.qop {
            header.push_str(&format!(", qop={qop}, nc={nc}, cnonce=\"{}\"", quote(cnonce)));
        }
        if let Some(opaque) = &self.opaque {
            header.push_str(&format!(", opaque=\"{}\"", quote(opaque)));
        }
        header
    }
}

fn quote(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Split one header value into `(scheme, params)` pairs.
///
/// A single value may carry several comma-joined challenges, e.g.
/// `Digest realm="a", nonce="b", Basic realm="a"`.
fn split_challenges(header: &str) -> Vec<(String, Vec<(String, String)>)> {
    let mut out: Vec<(String, Vec<(String, String)>)> = Vec::new();
    let mut rest = header;

    loop {
        rest = rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
        if rest.is_empty() {
            break;
        }

        let end = rest
            .find(|c: char| c == '=' || c == ',' || c.is_whitespace())
            .unwrap_or(rest.len());
        let token = &rest[..end];
        let after = rest[end..].trim_start();

        // a token followed by `=` (spaces allowed around it) is a parameter,
        // anything else starts a new challenge
        match after.strip_prefix('=') {
            Some(value) => {
                let (value, remaining) = read_value(value.trim_start());
                if let (false, Some(last)) = (token.is_empty(), out.last_mut()) {
                    last.1.push((token.to_string(), value));
                }
                rest = remaining;
            }
            None => {
                out.push((token.to_string(), Vec::new()));
                rest = after;
            }
        }
    }
    out
}

/// Read a quoted-string or token value; returns the value and what follows it.
fn read_value(s: &str) -> (String, &str) {
    let Some(quoted) = s.strip_prefix('"') else {
        let end = s.find(',').unwrap_or(s.len());
        return (s[..end].trim_end().to_string(), &s[end..]);
    };

    let mut value = String::new();
    let mut chars = quoted.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                if let Some((_, next)) = chars.next() {
                    value.push(next);
                }
            }
            '"' => return (value, &quoted[i + 1..]),
            c => value.push(c),
        }
    }
    // unterminated quote: take the rest
    (value, "")
}
