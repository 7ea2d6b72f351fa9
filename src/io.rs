use std::fs;
use std::io::Write;
use std::path::Path;

use crate::config::SimConfig;
use crate::constants::*;
use crate::error::{SimError, SimResult, TraceParseError};
use crate::process::{Event, Process};
use crate::scheduler::Simulator;

/// Load both input files and set up a run.
///
/// The scheduling strategy is checked before the process file is read, so
/// an unsupported strategy never touches the workload.
pub fn load_simulation<C: AsRef<Path>, P: AsRef<Path>>(config_path: C, programs_path: P) -> SimResult<Simulator> {
    let config = SimConfig::from_file(config_path)?;
    config.check_scheduling()?;
    let processes = load_processes(programs_path)?;
    Simulator::new(config, processes)
}

/// Read the process file, skipping whatever cannot be parsed
pub fn load_processes<P: AsRef<Path>>(path: P) -> SimResult<Vec<Process>> {
    let content = fs::read_to_string(path.as_ref()).map_err(|source| SimError::ProcessFile {
        path: path.as_ref().to_path_buf(),
        source,
    })?;
    Ok(parse_processes(&content))
}

/// Parse every record in `content`, ordered by arrival time. Records with
/// equal arrival keep their input order.
pub fn parse_processes(content: &str) -> Vec<Process> {
    let mut processes = Vec::new();

    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
            continue;
        }
        match parse_record(line) {
            Ok(process) => processes.push(process),
            Err(e) => log::warn!("line {}: skipping record: {}", lineno + 1, e),
        }
    }

    // sort_by_key is stable
    processes.sort_by_key(|p| p.arrival);
    processes
}

/// Parse one `ID/arrival/priority/{EVENT(arg),...}` record
pub fn parse_record(line: &str) -> Result<Process, TraceParseError> {
    let fields: Vec<&str> = line.splitn(RECORD_FIELDS, RECORD_SEPARATOR).collect();
    if fields.len() < RECORD_FIELDS {
        return Err(TraceParseError::MissingFields {
            expected: RECORD_FIELDS,
            found: fields.len(),
        });
    }

    let id = fields[0].trim();
    if id.is_empty() {
        return Err(TraceParseError::EmptyId);
    }
    let arrival: u64 = fields[1].trim().parse().map_err(|_| TraceParseError::InvalidNumber {
        field: "arrival time",
        value: fields[1].trim().to_string(),
    })?;
    let priority: i64 = fields[2].trim().parse().map_err(|_| TraceParseError::InvalidNumber {
        field: "priority",
        value: fields[2].trim().to_string(),
    })?;

    let body = fields[3].trim();
    let body = body.strip_prefix('{').unwrap_or(body);
    let body = body.strip_suffix('}').unwrap_or(body);

    let mut events = Vec::new();
    for token in body.split(EVENT_SEPARATOR) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match parse_event(token) {
            Ok(event) => events.push(event),
            Err(e) => log::warn!("process {}: skipping event {:?}: {}", id, token, e),
        }
    }

    Ok(Process::new(id, arrival, priority, events))
}

/// Parse a single `TAG(arg)` token
pub fn parse_event(token: &str) -> Result<Event, TraceParseError> {
    let (tag, arg) = match (token.find('('), token.rfind(')')) {
        (Some(open), Some(close)) if close > open => (&token[..open], token[open + 1..close].trim()),
        (Some(open), _) => (&token[..open], token[open + 1..].trim()),
        _ => (token, ""),
    };
    let tag = tag.trim().to_uppercase();

    let number = |field: &'static str| -> Result<u64, TraceParseError> {
        arg.parse().map_err(|_| TraceParseError::InvalidNumber {
            field,
            value: arg.to_string(),
        })
    };
    let page = || -> Result<u32, TraceParseError> {
        arg.parse().map_err(|_| TraceParseError::InvalidNumber {
            field: "page number",
            value: arg.to_string(),
        })
    };

    match tag.as_str() {
        "CALCUL" => Ok(Event::Compute(number("duration")?)),
        "LECTURE" => Ok(Event::Read(page()?)),
        "ECRITURE" => Ok(Event::Write(page()?)),
        "DORMIR" => Ok(Event::Sleep(number("duration")?)),
        "FIN" => Ok(Event::Terminate),
        _ => Err(TraceParseError::UnknownEvent(tag)),
    }
}

/// Write the whole run output to a file
pub fn write_output<P: AsRef<Path>>(path: P, output: &str) -> std::io::Result<()> {
    let mut file = fs::File::create(path.as_ref())?;
    file.write_all(output.as_bytes())?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_example() {
        let p = parse_record("P1/0/1/{CALCUL(30),LECTURE(2),ECRITURE(3),DORMIR(10),FIN(0)}").unwrap();
        assert_eq!(p.id, "P1");
        assert_eq!(p.arrival, 0);
        assert_eq!(p.priority, 1);
        assert_eq!(
            p.events(),
            &[Event::Compute(30), Event::Read(2), Event::Write(3), Event::Sleep(10), Event::Terminate]
        );
    }

    #[test]
    fn test_parse_record_tolerates_spacing_and_case() {
        let p = parse_record(" P2 / 15 / -2 / { calcul( 5 ) , fin } ").unwrap();
        assert_eq!(p.id, "P2");
        assert_eq!(p.arrival, 15);
        assert_eq!(p.priority, -2);
        assert_eq!(p.events(), &[Event::Compute(5), Event::Terminate]);
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            parse_record("P1/0/{FIN}").unwrap_err(),
            TraceParseError::MissingFields { expected: 4, found: 3 }
        );
    }

    #[test]
    fn test_bad_numbers_reject_record() {
        assert!(matches!(
            parse_record("P1/soon/0/{FIN}"),
            Err(TraceParseError::InvalidNumber { field: "arrival time", .. })
        ));
        assert!(matches!(
            parse_record("P1/-4/0/{FIN}"),
            Err(TraceParseError::InvalidNumber { field: "arrival time", .. })
        ));
        assert!(matches!(
            parse_record("P1/0/high/{FIN}"),
            Err(TraceParseError::InvalidNumber { field: "priority", .. })
        ));
        assert_eq!(parse_record("/0/0/{FIN}").unwrap_err(), TraceParseError::EmptyId);
    }

    #[test]
    fn test_bad_events_are_skipped() {
        let p = parse_record("P1/0/0/{CALCUL(10),SAUTER(3),LECTURE(x),ECRITURE(4),FIN}").unwrap();
        assert_eq!(p.events(), &[Event::Compute(10), Event::Write(4), Event::Terminate]);
    }

    #[test]
    fn test_parse_event_errors() {
        assert_eq!(parse_event("SAUTER(3)").unwrap_err(), TraceParseError::UnknownEvent("SAUTER".into()));
        assert!(matches!(parse_event("DORMIR()"), Err(TraceParseError::InvalidNumber { .. })));
        assert!(matches!(parse_event("LECTURE(-1)"), Err(TraceParseError::InvalidNumber { .. })));
        assert_eq!(parse_event("FIN(abc)").unwrap(), Event::Terminate);
    }

    #[test]
    fn test_parse_processes_sorts_stably_and_skips() {
        let content = "\
# id/arrival/priority/events
B/10/0/{FIN}

A/0/0/{FIN}
broken line
C/10/0/{FIN}
D/5/0/{FIN}
";
        let procs = parse_processes(content);
        let ids: Vec<&str> = procs.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "D", "B", "C"]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_processes("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, SimError::ProcessFile { .. }));
    }
}
