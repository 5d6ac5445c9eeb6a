use lazy_regex::lazy_regex;

/// A phone number / OTP code pair extracted from a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOtp {
    pub phone_number: String,
    pub otp_code: String,
}

// "OTP for +1 202 555 0199 is 834921" style: keyword first, then the
// number, then the code. Phone tokens may contain embedded spaces, so
// the capture admits internal whitespace between digit runs.
static PATTERN_A: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r"(?i)\b(?:otp|code)\s+(?:for\s+)?(\+?\d[\d\s]*)\s+(?:is\s+)?(\d{4,8})\b");

// Bare "12025550199: 834921" style, no keyword.
static PATTERN_B: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r"(\+?\d[\d\s]*\d)[\s:]+(\d{4,8})\b");

// Code-before-number style: "834921 is your code 12025550199". The two
// captures come out reversed relative to A and B.
static PATTERN_C: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r"(?is)\b(\d{4,8})\s+(?:is\s+)?(?:your\s+)?(?:otp|code)\b.*?(\+?\d[\d\s]*\d)");

/// Extract a phone number and OTP code from free-text message content.
///
/// The patterns are tried in a fixed order and the first match wins.
/// This precedence is part of the contract: a message that satisfies
/// both the keyword-first and the code-first form resolves via the
/// keyword-first pattern.
pub fn parse_otp_message(text: &str) -> Option<ParsedOtp> {
    let matchers: [fn(&str) -> Option<ParsedOtp>; 3] = [match_a, match_b, match_c];
    matchers.iter().find_map(|m| m(text))
}

fn match_a(text: &str) -> Option<ParsedOtp> {
    let caps = PATTERN_A.captures(text)?;
    Some(ParsedOtp {
        phone_number: strip_whitespace(&caps[1]),
        otp_code: caps[2].to_string(),
    })
}

fn match_b(text: &str) -> Option<ParsedOtp> {
    let caps = PATTERN_B.captures(text)?;
    let phone = strip_whitespace(&caps[1]);
    if !phone_length_ok(&phone) {
        return None;
    }
    Some(ParsedOtp {
        phone_number: phone,
        otp_code: caps[2].to_string(),
    })
}

fn match_c(text: &str) -> Option<ParsedOtp> {
    let caps = PATTERN_C.captures(text)?;
    let phone = strip_whitespace(&caps[2]);
    if !phone_length_ok(&phone) {
        return None;
    }
    Some(ParsedOtp {
        phone_number: phone,
        otp_code: caps[1].to_string(),
    })
}

/// Panels sometimes render numbers with embedded spaces
/// ("+1 202 555 0199"); the forwarded number must be contiguous.
fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

// Patterns B and C only accept phone-number-like tokens of 10-15
// characters (digits plus an optional leading '+'), counted after
// whitespace removal.
fn phone_length_ok(phone: &str) -> bool {
    (10..=15).contains(&phone.len())
}
