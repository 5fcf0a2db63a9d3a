use chrono::{NaiveDate, NaiveDateTime};

/// Parse `s` with the first format in `formats` that accepts it.
/// Date-only formats resolve to midnight.
pub fn parse_datetime<S: AsRef<str>>(s: &str, formats: &[S]) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    formats.iter().find_map(|fmt| {
        let fmt = fmt.as_ref();
        NaiveDateTime::parse_from_str(s, fmt).ok().or_else(|| {
            NaiveDate::parse_from_str(s, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d", "%m/%d/%Y"];

    #[test]
    fn full_timestamp() {
        let dt = parse_datetime("2024-12-22 00:05:00", &FORMATS).unwrap();
        assert_eq!(dt.to_string(), "2024-12-22 00:05:00");
    }

    #[test]
    fn date_only_is_midnight() {
        let dt = parse_datetime(" 2024-01-05 ", &FORMATS).unwrap();
        assert_eq!(dt.to_string(), "2024-01-05 00:00:00");
        let us = parse_datetime("01/05/2024", &FORMATS).unwrap();
        assert_eq!(us, dt);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_datetime("not-a-date", &FORMATS).is_none());
        assert!(parse_datetime("2024-13-40", &FORMATS).is_none());
        assert!(parse_datetime("", &FORMATS).is_none());
    }
}
