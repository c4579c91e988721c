//! Regex/DFA filter family: structured identifiers with validators.
//!
//! Patterns compile once into process-lifetime statics. The digit-shaped
//! categories (SSN, phone, fax) additionally scan the OCR shadow text when
//! tolerance is on; everything else sees only the raw document.

use once_cell::sync::Lazy;

use crate::filters::{keyword_nearby, prev_char_boundary, scan_specs, scan_specs_ocr, spec, DetectInput, PatternSpec};
use crate::span::{FilterType, Span};

// =============================================================================
// SSN
// =============================================================================

static SSN_SEPARATED: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec("ssn-dashed", 0.95, 0, r"\b\d{3}-\d{2}-\d{4}\b"),
        spec("ssn-spaced", 0.92, 0, r"\b\d{3}[ ]\d{2}[ ]\d{4}\b"),
        spec("ssn-dotted", 0.92, 0, r"\b\d{3}[.–]\d{2}[.–]\d{4}\b"),
    ]
});

static SSN_BARE: Lazy<Vec<PatternSpec>> =
    Lazy::new(|| vec![spec("ssn-bare-9", 0.75, 0, r"\b\d{9}\b")]);

static SSN_MASKED: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec("ssn-masked-head", 0.9, 0, r"[*Xx]{3}-[*Xx]{2}-\d{4}\b"),
        spec("ssn-masked-tail", 0.9, 0, r"\b\d{3}-\d{2}-[*Xx]{4}"),
    ]
});

/// Area 000/666/9xx, group 00, and serial 0000 are never issued.
fn ssn_digits_valid(value: &str) -> bool {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 9 {
        return false;
    }
    let area = &digits[..3];
    let group = &digits[3..5];
    let serial = &digits[5..];
    area != "000" && area != "666" && !area.starts_with('9') && group != "00" && serial != "0000"
}

fn labeled_npi_before(source: &str, start: usize) -> bool {
    let lo = prev_char_boundary(source, start.saturating_sub(20));
    source[lo..prev_char_boundary(source, start)]
        .to_ascii_lowercase()
        .contains("npi")
}

pub fn detect_ssn(input: &DetectInput) -> Vec<Span> {
    let mut out = scan_specs_ocr(input, FilterType::Ssn, &SSN_SEPARATED, |value, _, _| {
        ssn_digits_valid(value)
    });
    out.extend(scan_specs_ocr(
        input,
        FilterType::Ssn,
        &SSN_BARE,
        |value, _, start| ssn_digits_valid(value) && !labeled_npi_before(input.text, start),
    ));
    out.extend(scan_specs_ocr(input, FilterType::Ssn, &SSN_MASKED, |value, _, _| {
        // Partially masked SSNs redact even though the digits are not
        // fully recoverable.
        value.chars().filter(|c| c.is_ascii_digit()).count() >= 3
    }));
    out
}

// =============================================================================
// PHONE / FAX
// =============================================================================

static PHONE_PATTERNS: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec(
            "phone-nanp",
            0.9,
            0,
            r"(?i)(\+?1[-. ])?\(?\d{3}\)?[-. ]\d{3}[-. ]\d{4}(?:\s*(?:ext\.?|x|extension)\s*\d{1,6})?\b",
        ),
        spec("phone-compact", 0.85, 0, r"(\+?1)?\d{10}\b"),
        spec("phone-dotted", 0.9, 0, r"\d{3}\.\s?\d{3}\.\d{4}\b"),
        spec(
            "phone-vanity",
            0.88,
            0,
            r"(?i)(\+?1[-.])?\(?\d{3}\)?[-.]\d{3}-[A-Z]{4,7}\b",
        ),
    ]
});

fn phone_shape_ok(value: &str) -> bool {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    let letters = value.chars().filter(|c| c.is_ascii_alphabetic()).count();
    let ten_digit = match digits.len() {
        10 => true,
        11 => digits.starts_with('1'),
        _ => false,
    };
    if letters > 0 {
        // Vanity numbers: letters stand in for trailing digits.
        if digits.len() + letters < 10 {
            return false;
        }
    } else if !ten_digit {
        return false;
    }
    let area = if digits.len() == 11 { &digits[1..4] } else { &digits[..3.min(digits.len())] };
    area.parse::<u32>().map(|a| a >= 200).unwrap_or(false)
}

pub fn detect_phone(input: &DetectInput) -> Vec<Span> {
    let mut out = scan_specs_ocr(input, FilterType::Phone, &PHONE_PATTERNS, |value, _, start| {
        phone_shape_ok(value) && !labeled_npi_before(input.text, start)
    });
    for span in &mut out {
        let lower = span.text.to_ascii_lowercase();
        if span.text.starts_with('+') || lower.contains("ext") || lower.contains('x') {
            span.confidence = span.confidence.max(0.95);
        }
    }
    out
}

static FAX_PATTERNS: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec(
            "fax-labeled",
            0.95,
            1,
            r"(?i)\bfax(?:\s+(?:number|no|#))?\s*[#:]?\s*(\+?1?[-.\s]?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4})\b",
        ),
        spec(
            "fax-send-to",
            0.92,
            1,
            r"(?i)\b(?:send|transmit)(?:\s+(?:to|results))?\s+fax\s*[#:]?\s*(\+?1?[-.\s]?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4})\b",
        ),
    ]
});

pub fn detect_fax(input: &DetectInput) -> Vec<Span> {
    scan_specs_ocr(input, FilterType::Fax, &FAX_PATTERNS, |value, _, _| {
        phone_shape_ok(value)
    })
}

// =============================================================================
// EMAIL / URL / IP
// =============================================================================

static EMAIL_PATTERNS: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![spec(
        "email",
        0.95,
        0,
        r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b",
    )]
});

pub fn detect_email(input: &DetectInput) -> Vec<Span> {
    scan_specs(input, FilterType::Email, &EMAIL_PATTERNS, |_, _, _| true)
}

static URL_PATTERNS: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec(
            "url-standard",
            0.95,
            0,
            r#"(?i)\b(?:https?://|ftp://|www\.)[^\s<>"{}|\\^`\[\]]+"#,
        ),
        spec(
            "url-patient-portal",
            0.92,
            0,
            r#"(?i)\b(?:mychart|myhealth|patient(?:portal)?|epic|cerner|athena|meditech)[.\-]?[a-z0-9.\-]+\.(?:com|org|net|edu|health|healthcare|med)[^\s<>"{}|\\^`\[\]]*"#,
        ),
        spec(
            "url-healthcare-domain",
            0.85,
            0,
            r#"(?i)\b[a-z0-9][a-z0-9.\-]*(?:hospital|medical|health|clinic|care)[a-z0-9.\-]*\.[a-z]{2,}[^\s<>"{}|\\^`\[\]]*"#,
        ),
        spec(
            "url-social-profile",
            0.9,
            0,
            r#"(?i)\b(?:linkedin\.com/in/|facebook\.com/|twitter\.com/|instagram\.com/|x\.com/)[^\s<>"{}|\\^`\[\]]+"#,
        ),
    ]
});

pub fn detect_url(input: &DetectInput) -> Vec<Span> {
    scan_specs(input, FilterType::Url, &URL_PATTERNS, |_, _, _| true)
}

static IPV4_PATTERNS: Lazy<Vec<PatternSpec>> =
    Lazy::new(|| vec![spec("ipv4", 0.95, 0, r"\b(?:\d{1,3}\.){3}\d{1,3}\b")]);

static IPV6_PATTERNS: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec(
            "ipv6-full",
            0.9,
            0,
            r"\b(?:[0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}\b",
        ),
        spec(
            "ipv6-compressed",
            0.88,
            0,
            r"\b(?:[0-9a-fA-F]{1,4}:){1,6}(?::[0-9a-fA-F]{1,4}){1,6}\b",
        ),
    ]
});

fn ipv4_ok(ip: &str) -> bool {
    let mut count = 0;
    for part in ip.split('.') {
        count += 1;
        if count > 4 || part.is_empty() || part.len() > 3 {
            return false;
        }
        match part.parse::<u32>() {
            Ok(n) if n <= 255 => {}
            _ => return false,
        }
    }
    count == 4
}

fn ipv6_ok(ip: &str) -> bool {
    if !ip.contains(':') || ip.matches("::").count() > 1 {
        return false;
    }
    let parts: Vec<&str> = ip.split(':').collect();
    if parts.len() > 8 {
        return false;
    }
    parts
        .iter()
        .all(|p| p.len() <= 4 && p.chars().all(|c| c.is_ascii_hexdigit()))
}

pub fn detect_ip(input: &DetectInput) -> Vec<Span> {
    let mut out = scan_specs(input, FilterType::Ip, &IPV4_PATTERNS, |value, _, _| {
        ipv4_ok(value)
    });
    out.extend(scan_specs(input, FilterType::Ip, &IPV6_PATTERNS, |value, _, _| {
        ipv6_ok(value)
    }));
    out
}

// =============================================================================
// ZIPCODE
// =============================================================================

static ZIP_PATTERNS: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec("zip-plus4", 0.9, 0, r"\b\d{5}-\d{4}\b"),
        spec("zip-5", 0.85, 0, r"\b\d{5}\b"),
    ]
});

/// A 5-digit run that is really the tail of a phone/identifier segment
/// (`...312-45678`) is not a ZIP.
fn zip_is_phone_tail(text: &str, start: usize) -> bool {
    let bytes = text.as_bytes();
    if start >= 1 && (bytes[start - 1] == b'-' || bytes[start - 1] == b'.') {
        return start >= 2 && bytes[start - 2].is_ascii_digit();
    }
    false
}

/// The leading 5 digits of a ZIP+4 belong to the longer form.
fn zip_is_plus4_prefix(text: &str, start: usize, len: usize) -> bool {
    let end = start + len;
    let bytes = text.as_bytes();
    len == 5
        && bytes.get(end) == Some(&b'-')
        && bytes
            .get(end + 1..end + 5)
            .map(|tail| tail.iter().all(u8::is_ascii_digit))
            .unwrap_or(false)
}

pub fn detect_zipcode(input: &DetectInput) -> Vec<Span> {
    scan_specs(input, FilterType::Zipcode, &ZIP_PATTERNS, |value, _, start| {
        !zip_is_phone_tail(input.text, start) && !zip_is_plus4_prefix(input.text, start, value.len())
    })
}

// =============================================================================
// MRN
// =============================================================================

static MRN_PATTERNS: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec(
            "mrn-labeled",
            0.95,
            1,
            r"(?i)\b(?:MRN?|Medical\s+Record(?:\s+Number)?)\s*(?:[:#]\s*)?#?\s*([A-Z0-9][A-Z0-9-]{4,14})\b",
        ),
        spec(
            "mrn-chart",
            0.9,
            1,
            r"(?i)\b(?:Chart|Record|Case|Accession)(?:\s+(?:Number|No|#))?\s*(?:[:#]\s*)?#?\s*([A-Z0-9][A-Z0-9-]{4,11})\b",
        ),
        spec(
            "mrn-patient-id",
            0.9,
            1,
            r"(?i)\b(?:Patient)(?:\s+(?:ID|Number|#))?\s*(?:[:#]\s*)?#?\s*([A-Z0-9][A-Z0-9-]{4,14})\b",
        ),
        spec(
            "mrn-prefixed",
            0.9,
            1,
            r"\b((?:PAT|PT|MRN|PATIENT|MR|REC|CHART|CASE|ACC)_[A-Z0-9_]{4,20})\b",
        ),
        spec("mrn-hash", 0.85, 1, r"(?:^|[\s:;,(\[])#(\d{6,12})\b"),
    ]
});

pub fn detect_mrn(input: &DetectInput) -> Vec<Span> {
    scan_specs(input, FilterType::Mrn, &MRN_PATTERNS, |value, _, _| {
        value.chars().any(|c| c.is_ascii_digit())
    })
}

// =============================================================================
// NPI (Luhn over the 80840 card-issuer prefix)
// =============================================================================

static NPI_PATTERNS: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![spec(
        "npi-labeled",
        0.95,
        1,
        r"(?i)\bNPI(?:\s+(?:Number|No|#))?\s*[#:]*\s*([0-9]{10})\b",
    )]
});

fn luhn_ok(digits: impl Iterator<Item = u32>) -> bool {
    let collected: Vec<u32> = digits.collect();
    let mut sum = 0u32;
    let mut double = false;
    for d in collected.iter().rev() {
        let mut d = *d;
        if double {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
        double = !double;
    }
    !collected.is_empty() && sum % 10 == 0
}

fn npi_checksum_ok(value: &str) -> bool {
    if value.len() != 10 || !value.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let full = format!("80840{value}");
    luhn_ok(full.chars().filter_map(|c| c.to_digit(10)))
}

pub fn detect_npi(input: &DetectInput) -> Vec<Span> {
    scan_specs(input, FilterType::Npi, &NPI_PATTERNS, |value, _, _| {
        npi_checksum_ok(value)
    })
}

// =============================================================================
// DEA
// =============================================================================

static DEA_LABELED: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![spec(
        "dea-labeled",
        0.95,
        1,
        r"(?i)\bDEA(?:\s+(?:Number|No|#))?\s*[:#]?\s*([A-Z]{2}\d{7})\b",
    )]
});

static DEA_STANDALONE: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![spec(
        "dea-standalone",
        0.88,
        1,
        r"\b([ABFGMPRX][A-Z]\d{7})\b",
    )]
});

/// Registrant checksum: (d1+d3+d5) + 2*(d2+d4+d6), last digit must equal d7.
fn dea_checksum_ok(value: &str) -> bool {
    let digits: Vec<u32> = value.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 7 {
        return false;
    }
    let total = digits[0] + digits[2] + digits[4] + 2 * (digits[1] + digits[3] + digits[5]);
    total % 10 == digits[6]
}

pub fn detect_dea(input: &DetectInput) -> Vec<Span> {
    let mut out = scan_specs(input, FilterType::Dea, &DEA_LABELED, |value, _, _| {
        value.len() == 9
    });
    out.extend(scan_specs(input, FilterType::Dea, &DEA_STANDALONE, |value, _, _| {
        dea_checksum_ok(value)
    }));
    out
}

// =============================================================================
// CREDIT CARD
// =============================================================================

static CREDIT_CARD_PATTERNS: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec(
            "cc-labeled",
            0.95,
            1,
            r"(?i)\b(?:card|cc|credit\s*card)\s*[:#]?\s*([\d][\d\s-]{11,22}\d)\b",
        ),
        spec(
            "cc-grouped",
            0.95,
            0,
            r"\b\d{4}[\s-]?\d{4}[\s-]?\d{4}[\s-]?\d{1,7}\b",
        ),
        spec("cc-amex", 0.95, 0, r"\b3[47]\d{2}[\s-]?\d{6}[\s-]?\d{5}\b"),
        spec("cc-continuous", 0.9, 0, r"\b\d{13,19}\b"),
    ]
});

fn credit_card_ok(value: &str) -> bool {
    let digits: Vec<u32> = value.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 13 || digits.len() > 19 {
        return false;
    }
    luhn_ok(digits.into_iter())
}

pub fn detect_credit_card(input: &DetectInput) -> Vec<Span> {
    scan_specs(input, FilterType::CreditCard, &CREDIT_CARD_PATTERNS, |value, _, _| {
        credit_card_ok(value)
    })
}

// =============================================================================
// ACCOUNT
// =============================================================================

static ACCOUNT_PATTERNS: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec(
            "account-labeled",
            0.9,
            1,
            r"(?i)\b(?:Account|Acct)(?:\s+(?:Number|No|#))?\s*[#:]?\s*([0-9][0-9-]{5,14})\b",
        ),
        spec(
            "account-billing",
            0.88,
            1,
            r"(?i)\b(?:Billing|Bill)(?:\s+(?:Number|No|#))?\s*[#:]?\s*([0-9][0-9-]{5,14})\b",
        ),
        spec(
            "account-bank",
            0.9,
            1,
            r"(?i)\b(?:Bank(?:ing)?|Checking|Savings)\s+(?:Account|Acct)(?:\s+(?:Number|No|#))?\s*[:#]?\s*([*\d][-*\d]{3,15})\b",
        ),
        spec(
            "account-partial",
            0.85,
            1,
            r"(?i)\b(?:Account|Card)\s+(?:ending\s+in|last\s+4(?:\s+digits)?)[:\s]+([*\d]{4,6})\b",
        ),
        spec(
            "account-prefixed-id",
            0.85,
            1,
            r"\b((?:ACCT|PID|MID|SID|REF|CONF|TXN|INV|ORD|BILL)-\d{4,12})\b",
        ),
        spec(
            "account-billing-year",
            0.88,
            1,
            r"(?i)\b((?:BILL|ACCT|INV|PAY)-\d{4}-\d{6,10})\b",
        ),
    ]
});

fn account_ok(value: &str) -> bool {
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    let masked = value.chars().filter(|c| *c == '*').count();
    digits + masked >= 4 && digits + masked <= 16
}

pub fn detect_account(input: &DetectInput) -> Vec<Span> {
    scan_specs(input, FilterType::Account, &ACCOUNT_PATTERNS, |value, _, _| {
        account_ok(value)
    })
}

// =============================================================================
// LICENSE
// =============================================================================

static LICENSE_PATTERNS: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec(
            "license-dl",
            0.9,
            1,
            r"(?i)\b(?:DL|Driver'?s?\s+License|Drivers?\s+Lic)(?:\s+(?:Number|No|#))?\s*[#:]?\s*([A-Z]{0,2}[A-Z0-9-]{6,20})\b",
        ),
        spec(
            "license-professional",
            0.9,
            1,
            r"(?i)\b(?:Medical|Nursing|Professional|RN|MD|NP|PA)\s+(?:License|Lic)(?:\s+(?:Number|No|#))?\s*[#:]?\s*([A-Z0-9][A-Z0-9-]{4,19})\b",
        ),
        spec(
            "license-generic",
            0.88,
            1,
            r"(?i)\b(?:License|Lic)(?:\s+(?:Number|No))?\s*[#:]\s*([A-Z0-9][A-Z0-9-]{5,19})\b",
        ),
        spec(
            "license-prof-standalone",
            0.88,
            1,
            r"(?i)\b((?:RN|LPN|LVN|APRN|NP|CRNA|CNA|MD|DO|PA|PHARMD|PT|OT|SLP|LCSW|DDS|DMD|DC|DPM|OD)[-#]\d{5,10})\b",
        ),
        spec("license-clia", 0.92, 1, r"\b(\d{2}D\d{7})\b"),
    ]
});

fn license_ok(value: &str) -> bool {
    let cleaned: String = value
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect();
    (6..=20).contains(&cleaned.len())
        && cleaned.chars().any(|c| c.is_ascii_digit())
        && cleaned.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn detect_license(input: &DetectInput) -> Vec<Span> {
    scan_specs(input, FilterType::License, &LICENSE_PATTERNS, |value, _, _| {
        license_ok(value)
    })
}

// =============================================================================
// HEALTH PLAN
// =============================================================================

static HEALTH_PLAN_DIRECT: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec(
            "hp-medicare",
            0.92,
            1,
            r"(?i)\b(?:Medicare)(?:\s+(?:Number|No|ID|#))?\s*[#:]?\s*([A-Z0-9][A-Z0-9-]{9,14})\b",
        ),
        spec(
            "hp-medicaid",
            0.92,
            1,
            r"(?i)\b(?:Medicaid)(?:\s+(?:Number|No|ID|#))?\s*[#:]?\s*([A-Z0-9][A-Z0-9-]{7,19})\b",
        ),
        spec(
            "hp-member",
            0.88,
            1,
            r"(?i)\b(?:Member|Subscriber|Insurance)(?:\s+(?:ID|Number|No|#))?\s*[#:]?\s*([A-Z0-9][A-Z0-9-]{6,24})\b",
        ),
        spec(
            "hp-plan-code",
            0.88,
            1,
            r"(?i)\b((?:PLAN|GRP|POLICY|POL)-[A-Z0-9-]{4,24})\b",
        ),
    ]
});

static HEALTH_PLAN_CONTEXTUAL: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec(
            "hp-group",
            0.85,
            1,
            r"(?i)\b(?:Group)(?:\s+(?:Number|No|#))?\s*[#:]?\s*([A-Z0-9][A-Z0-9-]{4,24})\b",
        ),
        spec(
            "hp-plan",
            0.85,
            1,
            r"(?i)\b(?:Plan)(?:\s+(?:ID|Number|No|#))?\s*[#:]?\s*([A-Z0-9][A-Z0-9-]{4,24})\b",
        ),
    ]
});

static INSURANCE_KEYWORDS: &[&str] = &[
    "insurance",
    "medicare",
    "medicaid",
    "health plan",
    "coverage",
    "benefits",
    "premium",
    "deductible",
    "copay",
    "hmo",
    "ppo",
    "subscriber",
    "beneficiary",
    "carrier",
    "payer",
];

fn health_plan_ok(value: &str) -> bool {
    let cleaned: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    (7..=20).contains(&cleaned.len())
        && cleaned.chars().any(|c| c.is_ascii_digit())
        && cleaned.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn detect_health_plan(input: &DetectInput) -> Vec<Span> {
    let mut out = scan_specs(input, FilterType::HealthPlan, &HEALTH_PLAN_DIRECT, |value, _, _| {
        health_plan_ok(value)
    });
    out.extend(scan_specs(
        input,
        FilterType::HealthPlan,
        &HEALTH_PLAN_CONTEXTUAL,
        |value, full, start| {
            health_plan_ok(value)
                && keyword_nearby(input.text, start, full.len(), 100, INSURANCE_KEYWORDS)
        },
    ));
    out
}

// =============================================================================
// PASSPORT
// =============================================================================

static PASSPORT_LABELED: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![spec(
        "passport-labeled",
        0.95,
        1,
        r"(?i)\b(?:passport|travel\s*document)(?:\s*(?:no|#|number|num))?[\s:]+([A-Z]{1,2}\d{6,8}|\d{9}|[A-Z0-9]{9})\b",
    )]
});

static PASSPORT_STANDALONE: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec("passport-alpha", 0.87, 1, r"\b([A-Z]{1,2}\d{6,8})\b"),
        spec("passport-us", 0.85, 1, r"\b(\d{9})\b"),
    ]
});

static PASSPORT_KEYWORDS: &[&str] = &["passport", "travel document", "passport no", "passport #"];

fn passport_collides(text: &str, start: usize, value: &str) -> bool {
    // A 9-digit value near SSN or phone wording is almost certainly not a
    // passport number.
    keyword_nearby(
        text,
        start,
        value.len(),
        50,
        &["ssn", "social security", "phone", "tel", "fax", "cell", "mobile"],
    )
}

pub fn detect_passport(input: &DetectInput) -> Vec<Span> {
    let mut out = scan_specs(input, FilterType::Passport, &PASSPORT_LABELED, |_, _, _| true);
    out.extend(scan_specs(
        input,
        FilterType::Passport,
        &PASSPORT_STANDALONE,
        |value, _, start| {
            keyword_nearby(input.text, start, value.len(), 60, PASSPORT_KEYWORDS)
                && !passport_collides(input.text, start, value)
        },
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::tests::run;
    use crate::filters::FilterKind;

    #[test]
    fn ssn_dashed_detected_and_invalid_ranges_rejected() {
        let spans = run(FilterKind::Ssn, "SSN 123-45-6789 and bogus 666-12-3456 end");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "123-45-6789");
        assert!(spans[0].confidence > 0.9);
    }

    #[test]
    fn ssn_masked_forms_detected() {
        let spans = run(FilterKind::Ssn, "On file: ***-**-6789.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "***-**-6789");
    }

    #[test]
    fn ssn_area_and_group_rules() {
        assert!(ssn_digits_valid("123-45-6789"));
        assert!(!ssn_digits_valid("000-45-6789"));
        assert!(!ssn_digits_valid("666-45-6789"));
        assert!(!ssn_digits_valid("923-45-6789"));
        assert!(!ssn_digits_valid("123-00-6789"));
        assert!(!ssn_digits_valid("123-45-0000"));
    }

    #[test]
    fn phone_with_parens_detected() {
        let spans = run(FilterKind::Phone, "Call (555) 123-4567 today");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "(555) 123-4567");
    }

    #[test]
    fn phone_low_area_code_rejected() {
        let spans = run(FilterKind::Phone, "Call (199) 123-4567 today");
        assert!(spans.is_empty());
    }

    #[test]
    fn phone_short_run_not_matched() {
        assert!(run(FilterKind::Phone, "Call Button: 555").is_empty());
    }

    #[test]
    fn fax_requires_label() {
        let spans = run(FilterKind::Fax, "Fax: (303) 555-0188");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "(303) 555-0188");
        assert!(run(FilterKind::Fax, "Call (303) 555-0188").is_empty());
    }

    #[test]
    fn email_detected() {
        let spans = run(FilterKind::Email, "Reach me at jane.doe+phi@clinic.org soon");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "jane.doe+phi@clinic.org");
    }

    #[test]
    fn ipv4_octets_validated() {
        let spans = run(FilterKind::Ip, "from 10.0.0.12 not 999.1.1.1");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "10.0.0.12");
    }

    #[test]
    fn ipv6_detected() {
        let spans = run(FilterKind::Ip, "host 2001:0db8:85a3:0000:0000:8a2e:0370:7334 up");
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn zip_plus4_and_phone_tail_guard() {
        let spans = run(FilterKind::Zipcode, "Boulder CO 80301-1234");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "80301-1234");
        assert!(zip_is_phone_tail("312-45678", 4));
    }

    #[test]
    fn mrn_labeled_detected() {
        let spans = run(FilterKind::Mrn, "MRN: 448-29-771X is on file");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "448-29-771X");
    }

    #[test]
    fn npi_checksum_gates() {
        let spans = run(FilterKind::Npi, "NPI: 1234567893");
        assert_eq!(spans.len(), 1);
        assert!(run(FilterKind::Npi, "NPI: 1234567890").is_empty());
    }

    #[test]
    fn dea_standalone_requires_checksum() {
        let spans = run(FilterKind::Dea, "prescriber AB1234563 on record");
        assert_eq!(spans.len(), 1);
        assert!(run(FilterKind::Dea, "prescriber AB1234567 on record").is_empty());
    }

    #[test]
    fn credit_card_luhn_required() {
        let spans = run(FilterKind::CreditCard, "card 4111 1111 1111 1111 billed");
        assert_eq!(spans.len(), 1);
        assert!(run(FilterKind::CreditCard, "card 4111 1111 1111 1112 billed").is_empty());
    }

    #[test]
    fn account_labeled() {
        let spans = run(FilterKind::Account, "Account #: 123456789");
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn license_professional() {
        let spans = run(FilterKind::License, "Nursing License #: RN-7734821");
        assert!(!spans.is_empty());
    }

    #[test]
    fn health_plan_group_requires_insurance_context() {
        assert!(run(FilterKind::HealthPlan, "Group: ABC12345 assigned").is_empty());
        let spans = run(
            FilterKind::HealthPlan,
            "Insurance carrier Aetna, Group: ABC12345 assigned",
        );
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn passport_standalone_requires_keyword() {
        assert!(run(FilterKind::Passport, "ref C0361195X").is_empty());
        let spans = run(FilterKind::Passport, "Passport No: C0361195");
        assert_eq!(spans.len(), 1);
    }
}
