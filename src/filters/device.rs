//! Device, vehicle, biometric, and membership-identifier detectors.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::filters::{keyword_nearby, scan_specs, spec, DetectInput, PatternSpec};
use crate::span::{FilterType, Span};

// =============================================================================
// DEVICE (medical device identifiers; context-aware keywords)
// =============================================================================

static DEVICE_KEYWORDS: &[&str] = &[
    "pacemaker",
    "defibrillator",
    "icd",
    "crt",
    "implant",
    "device",
    "stent",
    "catheter",
    "pump",
    "stimulator",
    "valve",
    "prosthesis",
];

static DEVICE_LABELED: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![spec(
        "device-with-serial",
        0.95,
        1,
        r"(?i)\b(?:Pacemaker|Defibrillator|ICD|CRT|Implant|Device|Prosthesis|Stent|Catheter|Pump|Stimulator|Valve)\s+(?:Serial|SN|ID|Number|Model)\s*[#:]{0,2}\s*([A-Z0-9][A-Z0-9-]{6,24})\b",
    )]
});

static DEVICE_CONTEXTUAL: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec(
            "device-model",
            0.9,
            1,
            r"(?i)\b(?:Model)(?:\s+(?:Number|No|#))?\s*[#:]{0,2}\s*([A-Z0-9][A-Z0-9-]{6,24})\b",
        ),
        spec(
            "device-serial",
            0.9,
            1,
            r"(?i)\b(?:Serial|SN)(?:\s+(?:Number|No|#))?\s*[#:]{0,2}\s*([A-Z0-9][A-Z0-9-]{6,24})\b",
        ),
    ]
});

static DEVICE_PREFIXED: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec(
            "device-manufacturer",
            0.92,
            1,
            r"(?i)\b((?:MEDTRONIC|ABBOTT|STRYKER|BOSTON|ZIMMER|BIOMET|DEPUY|PHILIPS|SIEMENS|BIOTRONIK|RESMED)(?:-[A-Z0-9]+){1,3})\b",
        ),
        spec(
            "device-prefix-code",
            0.88,
            1,
            r"(?i)\b((?:PM|ICD|CRT|IPG|INS|CGM|VAD|LVAD|SCS|DBS|VNS|MDT|SJM|DEV|SER|MOD|REF|LOT|UDI)-[A-Z0-9]{5,})\b",
        ),
    ]
});

fn device_identifier_ok(value: &str) -> bool {
    let cleaned: String = value.chars().filter(|c| *c != '-').collect();
    (7..=25).contains(&cleaned.len())
        && cleaned.chars().any(|c| c.is_ascii_digit())
        && cleaned.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn detect_device(input: &DetectInput) -> Vec<Span> {
    let mut out = scan_specs(input, FilterType::Device, &DEVICE_LABELED, |value, _, _| {
        device_identifier_ok(value)
    });
    out.extend(scan_specs(
        input,
        FilterType::Device,
        &DEVICE_CONTEXTUAL,
        |value, full, start| {
            device_identifier_ok(value)
                && keyword_nearby(input.text, start, full.len(), 100, DEVICE_KEYWORDS)
        },
    ));
    out.extend(scan_specs(input, FilterType::Device, &DEVICE_PREFIXED, |value, _, _| {
        value.chars().any(|c| c.is_ascii_digit())
    }));
    out
}

// =============================================================================
// VEHICLE (VIN / plates / GPS)
// =============================================================================

static VIN_LABELED: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![spec(
        "vin-labeled",
        0.98,
        1,
        r"(?i)\b(?:VIN|Vehicle\s+Identification\s+Number|Vehicle\s+ID)[\s:#]*([A-HJ-NPR-Z0-9]{17})\b",
    )]
});

static VIN_STANDALONE: Lazy<Vec<PatternSpec>> =
    Lazy::new(|| vec![spec("vin-standalone", 0.85, 1, r"\b([A-HJ-NPR-Z0-9]{17})\b")]);

static PLATE_LABELED: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![spec(
        "plate-labeled",
        0.95,
        1,
        r"(?i)\b(?:license\s+plate|plate\s+number|plate)[\s:#]*([A-Z]{2}[-\s]?[A-Z0-9]{5,7}|[A-Z0-9]{2,3}[-\s]?[A-Z0-9]{3,4})\b",
    )]
});

static GPS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(-?\d{1,3}\.\d{4,10})\s*°?\s*[NS]?,\s*(-?\d{1,3}\.\d{4,10})\s*°?\s*[EW]?")
        .expect("gps re")
});

fn vin_ok(vin: &str) -> bool {
    vin.len() == 17
        && vin
            .chars()
            .all(|c| c.is_ascii_digit() || (c.is_ascii_uppercase() && !"IOQ".contains(c)))
        && vin.chars().any(|c| c.is_ascii_digit())
        && !vin.chars().all(|c| Some(c) == vin.chars().next())
}

fn plate_ok(plate: &str) -> bool {
    let cleaned: String = plate
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    (4..=8).contains(&cleaned.len())
        && cleaned.chars().any(|c| c.is_ascii_digit())
        && cleaned.chars().any(|c| c.is_ascii_alphabetic())
}

pub fn detect_vehicle(input: &DetectInput) -> Vec<Span> {
    let mut out = scan_specs(input, FilterType::Vehicle, &VIN_LABELED, |value, _, _| {
        vin_ok(value)
    });
    out.extend(scan_specs(input, FilterType::Vehicle, &VIN_STANDALONE, |value, _, _| {
        vin_ok(value)
    }));
    out.extend(scan_specs(input, FilterType::Vehicle, &PLATE_LABELED, |value, _, _| {
        plate_ok(value)
    }));

    for caps in GPS_RE.captures_iter(input.text) {
        let m = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        let lat: f64 = match caps.get(1).and_then(|g| g.as_str().parse().ok()) {
            Some(v) => v,
            None => continue,
        };
        let lon: f64 = match caps.get(2).and_then(|g| g.as_str().parse().ok()) {
            Some(v) => v,
            None => continue,
        };
        if !((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)) {
            continue;
        }
        if out.iter().any(|s| s.start == m.start() && s.end == m.end()) {
            continue;
        }
        out.push(Span::detected(
            FilterType::Vehicle,
            m.start(),
            m.end(),
            m.as_str(),
            0.92,
            "gps-coordinates",
        ));
    }

    out
}

// =============================================================================
// BIOMETRIC
// =============================================================================

static BIOMETRIC_PATTERNS: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec(
            "biometric-labeled",
            0.94,
            0,
            r"(?i)\b(?:fingerprint|retina|iris|voiceprint|facial\s*recognition|biometric)\s*(?:id|identifier|data|scan|template|hash|record)\s*[:#]?\s*[A-Z0-9][A-Z0-9\-_]{5,}\b",
        ),
        spec(
            "biometric-dna",
            0.95,
            0,
            r"(?i)\b(?:dna|genetic|genome)\s*(?:id|identifier|profile|sample|marker|sequence)\s*[:#]?\s*[A-Z0-9][A-Z0-9\-_]{5,}\b",
        ),
        spec(
            "biometric-face",
            0.93,
            0,
            r"(?i)\b(?:face|facial|photo)\s*(?:id|template|encoding|vector)\s*[:#]?\s*[A-Z0-9][A-Z0-9\-_]{5,}\b",
        ),
    ]
});

pub fn detect_biometric(input: &DetectInput) -> Vec<Span> {
    scan_specs(input, FilterType::Biometric, &BIOMETRIC_PATTERNS, |_, _, _| true)
}

// =============================================================================
// UNIQUE_ID (membership / loyalty / badge)
// =============================================================================

static UNIQUE_ID_PATTERNS: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![
        spec(
            "unique-membership",
            0.94,
            0,
            r"(?i)\b(?:member(?:ship)?|loyalty|rewards?|subscriber|customer)\s*(?:id|number|#|no\.?|code)\s*[:\-]?\s*[A-Z0-9][A-Z0-9\-]{4,}\b",
        ),
        spec(
            "unique-badge",
            0.91,
            0,
            r"(?i)\b(?:badge|access|employee|staff|visitor)\s*(?:id|number|#|no\.?|code|card)\s*[:\-]?\s*[A-Z0-9][A-Z0-9\-]{4,}\b",
        ),
    ]
});

static UNIQUE_CONTEXT_ID: Lazy<Vec<PatternSpec>> = Lazy::new(|| {
    vec![spec(
        "unique-contextual",
        0.88,
        1,
        r"\b([A-Z]{2,}[-#][A-Z0-9]{5,})\b",
    )]
});

static MEMBERSHIP_KEYWORDS: &[&str] = &[
    "member",
    "membership",
    "loyalty",
    "rewards",
    "points",
    "subscriber",
    "customer",
    "badge",
    "access",
];

pub fn detect_unique_id(input: &DetectInput) -> Vec<Span> {
    let mut out = scan_specs(input, FilterType::UniqueId, &UNIQUE_ID_PATTERNS, |_, _, _| true);
    out.extend(scan_specs(
        input,
        FilterType::UniqueId,
        &UNIQUE_CONTEXT_ID,
        |value, _, start| {
            value.chars().filter(|c| c.is_ascii_digit()).count() >= 3
                && keyword_nearby(input.text, start, value.len(), 80, MEMBERSHIP_KEYWORDS)
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
    fn device_serial_needs_device_context() {
        assert!(run(FilterKind::Device, "Serial: AX99-20413 shipped with the couch").is_empty());
        let spans = run(FilterKind::Device, "Pacemaker implant, Serial: AX99-20413");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "AX99-20413");
    }

    #[test]
    fn device_labeled_serial() {
        let spans = run(FilterKind::Device, "Pacemaker Serial #: PM2019-44812");
        assert!(!spans.is_empty());
    }

    #[test]
    fn vin_detected_and_validated() {
        let spans = run(FilterKind::Vehicle, "VIN: 1HGCM82633A004352 on record");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "1HGCM82633A004352");
        assert!(run(FilterKind::Vehicle, "VIN: 1HGCM82633A00435I bad").is_empty());
    }

    #[test]
    fn gps_coordinates() {
        let spans = run(FilterKind::Vehicle, "found at 40.0150, -105.2705 by EMS");
        assert_eq!(spans.len(), 1);
        assert!(run(FilterKind::Vehicle, "value 400.0150, -1050.2705 noise").is_empty());
    }

    #[test]
    fn biometric_labeled() {
        let spans = run(FilterKind::Biometric, "fingerprint scan: FP-889Q2K1 archived");
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn membership_id_and_contextual() {
        let spans = run(FilterKind::UniqueId, "Membership ID: GOLD-2231987");
        assert!(!spans.is_empty());
        assert!(run(FilterKind::UniqueId, "code FR-AB123 on the box").is_empty());
    }
}
