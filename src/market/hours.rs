use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;

/// Submission arrived after the session's opening wall-clock time, so the
/// opening price can no longer be captured forward-looking.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct CutoffError(pub String);

#[derive(Debug, Clone)]
pub struct MarketStatus {
    pub is_open: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct MarketSession {
    timezone: Tz,
    open: (u32, u32),
    close: (u32, u32),
}

const US_SESSION: MarketSession = MarketSession {
    timezone: chrono_tz::America::New_York,
    open: (9, 30),
    close: (16, 0),
};

/// Exchange session table. Unknown symbols fall back to the US session.
fn session_for(symbol: &str) -> MarketSession {
    let sym = symbol.trim().to_uppercase();

    match sym.as_str() {
        "^NSEI" | "NSEI" | "^BSESN" | "BSESN" => MarketSession {
            timezone: chrono_tz::Asia::Kolkata,
            open: (9, 15),
            close: (15, 30),
        },
        "^FTSE" | "FTSE" => MarketSession {
            timezone: chrono_tz::Europe::London,
            open: (8, 0),
            close: (16, 30),
        },
        "^GDAXI" | "GDAXI" | "^STOXX50E" => MarketSession {
            timezone: chrono_tz::Europe::Berlin,
            open: (9, 0),
            close: (17, 30),
        },
        "^N225" | "N225" => MarketSession {
            timezone: chrono_tz::Asia::Tokyo,
            open: (9, 0),
            close: (15, 0),
        },
        "^HSI" | "HSI" => MarketSession {
            timezone: chrono_tz::Asia::Hong_Kong,
            open: (9, 30),
            close: (16, 0),
        },
        "^AXJO" | "AXJO" => MarketSession {
            timezone: chrono_tz::Australia::Sydney,
            open: (10, 0),
            close: (16, 0),
        },
        "000001.SS" | "^SSEC" => MarketSession {
            timezone: chrono_tz::Asia::Shanghai,
            open: (9, 30),
            close: (15, 0),
        },
        _ => session_from_suffix(&sym),
    }
}

fn session_from_suffix(sym: &str) -> MarketSession {
    if sym.ends_with(".NS") || sym.ends_with(".BO") {
        MarketSession {
            timezone: chrono_tz::Asia::Kolkata,
            open: (9, 15),
            close: (15, 30),
        }
    } else if sym.ends_with(".L") {
        MarketSession {
            timezone: chrono_tz::Europe::London,
            open: (8, 0),
            close: (16, 30),
        }
    } else if sym.ends_with(".DE") {
        MarketSession {
            timezone: chrono_tz::Europe::Berlin,
            open: (9, 0),
            close: (17, 30),
        }
    } else if sym.ends_with(".T") {
        MarketSession {
            timezone: chrono_tz::Asia::Tokyo,
            open: (9, 0),
            close: (15, 0),
        }
    } else if sym.ends_with(".HK") {
        MarketSession {
            timezone: chrono_tz::Asia::Hong_Kong,
            open: (9, 30),
            close: (16, 0),
        }
    } else if sym.ends_with(".AX") {
        MarketSession {
            timezone: chrono_tz::Australia::Sydney,
            open: (10, 0),
            close: (16, 0),
        }
    } else if sym.ends_with(".SS") || sym.ends_with(".SZ") {
        MarketSession {
            timezone: chrono_tz::Asia::Shanghai,
            open: (9, 30),
            close: (15, 0),
        }
    } else {
        US_SESSION
    }
}

/// Whether the symbol's home market is currently in session.
pub fn market_status(symbol: &str, now: DateTime<Utc>) -> MarketStatus {
    let session = session_for(symbol);
    let local = now.with_timezone(&session.timezone);

    if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        return MarketStatus {
            is_open: false,
            message: Some(format!(
                "Market is closed for the weekend ({})",
                local.weekday()
            )),
        };
    }

    let minute_of_day = local.hour() * 60 + local.minute();
    let open_minute = session.open.0 * 60 + session.open.1;
    let close_minute = session.close.0 * 60 + session.close.1;

    if minute_of_day >= open_minute && minute_of_day < close_minute {
        MarketStatus {
            is_open: true,
            message: None,
        }
    } else {
        MarketStatus {
            is_open: false,
            message: Some(format!(
                "Market is closed. Trading hours are {:02}:{:02}-{:02}:{:02} ({})",
                session.open.0, session.open.1, session.close.0, session.close.1, session.timezone
            )),
        }
    }
}

/// The next instant, strictly after `now`, at which the symbol's home
/// market opens. Searches forward up to 7 calendar days, skipping weekends.
pub fn next_open_instant(symbol: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let session = session_for(symbol);
    let local_today = now.with_timezone(&session.timezone).date_naive();

    for offset in 0..=7u64 {
        let date = local_today.checked_add_days(Days::new(offset))?;
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }

        let open = utc_for_wall_clock(session.timezone, date, session.open.0, session.open.1);
        if open > now {
            return Some(open);
        }
    }

    None
}

/// The London forex session opening reference (08:00 Europe/London) for the
/// current local day. Rejects submissions at or after the opening time.
pub fn london_forex_open_reference(now: DateTime<Utc>) -> Result<DateTime<Utc>, CutoffError> {
    session_open_reference(
        chrono_tz::Europe::London,
        8,
        0,
        "London forex session",
        now,
    )
}

/// The US market opening reference (09:30 America/New_York) for the current
/// local day. Rejects submissions at or after the opening time.
pub fn us_market_open_reference(now: DateTime<Utc>) -> Result<DateTime<Utc>, CutoffError> {
    session_open_reference(
        chrono_tz::America::New_York,
        9,
        30,
        "US market session",
        now,
    )
}

fn session_open_reference(
    timezone: Tz,
    hour: u32,
    minute: u32,
    label: &str,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, CutoffError> {
    let local_date = now.with_timezone(&timezone).date_naive();
    let open = utc_for_wall_clock(timezone, local_date, hour, minute);

    if now >= open {
        return Err(CutoffError(format!(
            "The {label} already opened at {hour:02}:{minute:02} local time. \
             Opening predictions must be submitted before the session opens."
        )));
    }

    Ok(open)
}

/// Find the UTC instant whose wall-clock reading in `timezone` equals the
/// requested date and time.
///
/// The timezone's UTC offset depends on the date being resolved (daylight
/// saving), so the instant is found by converging projection: start from the
/// wall-clock value read as UTC, re-project into the timezone, and shift the
/// guess by the signed minute delta, normalized into [-720, 720) to absorb
/// day-boundary wraparound. Stabilizes within three iterations.
fn utc_for_wall_clock(timezone: Tz, date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    let target =
        date.and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN));

    let mut guess = DateTime::<Utc>::from_naive_utc_and_offset(target, Utc);

    for _ in 0..4 {
        let local = guess.with_timezone(&timezone).naive_local();
        let mut delta = (target - local).num_minutes();
        delta = (delta + 720).rem_euclid(1440) - 720;

        if delta == 0 {
            break;
        }
        guess += Duration::minutes(delta);
    }

    guess
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_weekend_is_closed_regardless_of_hour() {
        // Saturday 2025-06-14, mid-session hours in every zone we track
        for symbol in ["^GSPC", "^NSEI", "^FTSE", "^N225", "UNKNOWN"] {
            let status = market_status(symbol, utc(2025, 6, 14, 12, 0));
            assert!(!status.is_open, "{symbol} should be closed on Saturday");
            assert!(status.message.is_some());
        }
    }

    #[test]
    fn test_us_session_open_and_closed() {
        // Monday 2025-06-16 10:00 EDT = 14:00 UTC
        assert!(market_status("AAPL", utc(2025, 6, 16, 14, 0)).is_open);
        // Monday 2025-06-16 08:00 EDT = 12:00 UTC (pre-open)
        let early = market_status("AAPL", utc(2025, 6, 16, 12, 0));
        assert!(!early.is_open);
        assert!(early.message.is_some());
    }

    #[test]
    fn test_india_session_from_suffix() {
        // Monday 2025-06-16 10:30 IST = 05:00 UTC
        assert!(market_status("RELIANCE.NS", utc(2025, 6, 16, 5, 0)).is_open);
        // Monday 2025-06-16 16:00 IST = 10:30 UTC (post-close)
        assert!(!market_status("RELIANCE.BO", utc(2025, 6, 16, 10, 30)).is_open);
    }

    #[test]
    fn test_next_open_skips_weekend() {
        // Friday 2025-06-13 21:00 UTC, after the US close
        let now = utc(2025, 6, 13, 21, 0);
        let open = next_open_instant("^GSPC", now).unwrap();

        // Monday 2025-06-16 09:30 EDT = 13:30 UTC
        assert_eq!(open, utc(2025, 6, 16, 13, 30));
        assert!(open > now);
        assert_eq!(
            open.with_timezone(&chrono_tz::America::New_York).weekday(),
            Weekday::Mon
        );
    }

    #[test]
    fn test_next_open_same_day_before_open() {
        // Monday 2025-06-16 08:00 UTC — Indian market opens 09:15 IST = 03:45 UTC,
        // already past, so next open is Tuesday.
        let now = utc(2025, 6, 16, 8, 0);
        let open = next_open_instant("^NSEI", now).unwrap();
        assert_eq!(open, utc(2025, 6, 17, 3, 45));
    }

    #[test]
    fn test_wall_clock_projection_handles_dst() {
        // 09:30 New York is 13:30 UTC in summer (EDT)...
        let summer = utc_for_wall_clock(
            chrono_tz::America::New_York,
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            9,
            30,
        );
        assert_eq!(summer, utc(2025, 3, 10, 13, 30));

        // ...and 14:30 UTC in winter (EST), two trading days earlier.
        let winter = utc_for_wall_clock(
            chrono_tz::America::New_York,
            NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
            9,
            30,
        );
        assert_eq!(winter, utc(2025, 3, 7, 14, 30));
    }

    #[test]
    fn test_london_forex_reference_before_cutoff() {
        // Monday 2025-06-16 07:55 UK (BST) = 06:55 UTC
        let reference = london_forex_open_reference(utc(2025, 6, 16, 6, 55)).unwrap();
        // 08:00 BST = 07:00 UTC
        assert_eq!(reference, utc(2025, 6, 16, 7, 0));
    }

    #[test]
    fn test_london_forex_reference_after_cutoff() {
        // Monday 2025-06-16 08:05 UK (BST) = 07:05 UTC
        let result = london_forex_open_reference(utc(2025, 6, 16, 7, 5));
        assert!(result.is_err());
    }

    #[test]
    fn test_london_forex_reference_in_winter() {
        // Monday 2025-01-13 07:55 UK (GMT) = 07:55 UTC
        let reference = london_forex_open_reference(utc(2025, 1, 13, 7, 55)).unwrap();
        assert_eq!(reference, utc(2025, 1, 13, 8, 0));
    }

    #[test]
    fn test_us_open_reference_cutoff() {
        // Monday 2025-06-16 09:25 EDT = 13:25 UTC
        let reference = us_market_open_reference(utc(2025, 6, 16, 13, 25)).unwrap();
        assert_eq!(reference, utc(2025, 6, 16, 13, 30));

        // 09:31 EDT = 13:31 UTC
        assert!(us_market_open_reference(utc(2025, 6, 16, 13, 31)).is_err());
    }
}
