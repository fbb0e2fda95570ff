use std::error::Error;
use std::fmt::{self, Display};
use std::str::FromStr;

/// The shape of the provider API a conversation is spoken in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiKind {
    /// "Responses"-style APIs, which return a flat `output` array of
    /// typed items.
    Responses,
    /// "Chat completions"-style APIs, which return `choices` that each
    /// carry one assistant message.
    ChatCompletions,
}

impl ApiKind {
    /// Returns the selector string of this kind.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            ApiKind::Responses => "responses",
            ApiKind::ChatCompletions => "chat.completions",
        }
    }
}

impl Display for ApiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiKind {
    type Err = UnsupportedApiKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "responses" => Ok(ApiKind::Responses),
            "chat.completions" => Ok(ApiKind::ChatCompletions),
            _ => Err(UnsupportedApiKind(s.to_owned())),
        }
    }
}

/// The error returned when parsing an unknown [`ApiKind`] selector.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnsupportedApiKind(pub String);

impl Display for UnsupportedApiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported API kind `{}`, use `responses` or `chat.completions`",
            self.0
        )
    }
}

impl Error for UnsupportedApiKind {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selector() {
        assert_eq!("responses".parse(), Ok(ApiKind::Responses));
        assert_eq!("chat.completions".parse(), Ok(ApiKind::ChatCompletions));
        assert_eq!(
            "completions".parse::<ApiKind>(),
            Err(UnsupportedApiKind("completions".to_owned()))
        );

        for kind in [ApiKind::Responses, ApiKind::ChatCompletions] {
            assert_eq!(kind.to_string().parse(), Ok(kind));
        }
    }
}
