use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use super::command::Command;
use super::models::{CommandStatus, Schedule};
use super::wire::non_empty;
use super::ScannerSession;
use crate::errors::VulnscanError;

pub const DTSTART_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    fn rrule(&self) -> &'static str {
        match self {
            Frequency::Hourly => "HOURLY",
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }

    fn unit(&self) -> &'static str {
        match self {
            Frequency::Hourly => "hour",
            Frequency::Daily => "day",
            Frequency::Weekly => "week",
            Frequency::Monthly => "month",
            Frequency::Yearly => "year",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rrule())
    }
}

impl FromStr for Frequency {
    type Err = VulnscanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hourly" => Ok(Frequency::Hourly),
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(VulnscanError::Validation(format!(
                "Invalid frequency '{}', expected hourly, daily, weekly, monthly or yearly",
                other
            ))),
        }
    }
}

/// A recurrence to render as an iCalendar VEVENT.
#[derive(Debug, Clone, PartialEq)]
pub struct Recurrence {
    pub dtstart: NaiveDateTime,
    pub frequency: Frequency,
    pub interval: u32,
    pub count: Option<u32>,
}

pub fn parse_dtstart(raw: &str) -> Result<NaiveDateTime, VulnscanError> {
    NaiveDateTime::parse_from_str(raw.trim(), DTSTART_FORMAT).map_err(|_| {
        VulnscanError::Validation("Invalid dtstart, expected YYYY-MM-DDTHH:MM:SS".into())
    })
}

/// Renders a single-event calendar with an RRULE.
pub fn render_icalendar(rec: &Recurrence, now: DateTime<Utc>) -> String {
    let mut rrule = format!("FREQ={};INTERVAL={}", rec.frequency.rrule(), rec.interval.max(1));
    if let Some(count) = rec.count {
        rrule.push_str(&format!(";COUNT={}", count));
    }
    let lines = [
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//vulnscan//schedule//EN".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}", uuid::Uuid::new_v4()),
        format!("DTSTAMP:{}", now.format("%Y%m%dT%H%M%SZ")),
        format!("DTSTART:{}", rec.dtstart.format("%Y%m%dT%H%M%S")),
        format!("RRULE:{}", rrule),
        "END:VEVENT".to_string(),
        "END:VCALENDAR".to_string(),
    ];
    let mut ical = lines.join("\r\n");
    ical.push_str("\r\n");
    ical
}

/// Reads the first RRULE back into text such as `"Every 2 week(s)"`.
pub fn period_from_icalendar(ical: &str) -> Option<String> {
    // Undo RFC 5545 line folding before looking for the property.
    let unfolded = ical.replace("\r\n ", "").replace("\n ", "");
    let rule = unfolded
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("RRULE:"))?;

    let mut freq = None;
    let mut interval = 1u32;
    for part in rule.split(';') {
        let (key, value) = part.split_once('=')?;
        match key.to_ascii_uppercase().as_str() {
            "FREQ" => freq = value.parse::<Frequency>().ok(),
            "INTERVAL" => interval = value.parse().unwrap_or(1),
            _ => {}
        }
    }
    freq.map(|f| format!("Every {} {}(s)", interval, f.unit()))
}

#[derive(Debug, Deserialize)]
struct SchedulesResponse {
    #[serde(rename = "schedule", default)]
    schedules: Vec<WireSchedule>,
}

#[derive(Debug, Deserialize)]
struct WireSchedule {
    #[serde(rename = "@id", default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    owner: Option<WireOwner>,
    #[serde(default)]
    icalendar: String,
    #[serde(default)]
    timezone: String,
    #[serde(default)]
    next_time: String,
    #[serde(default)]
    last_time: String,
    #[serde(default)]
    creation_time: String,
    #[serde(default)]
    modification_time: String,
}

#[derive(Debug, Deserialize)]
struct WireOwner {
    #[serde(default)]
    name: String,
}

impl From<WireSchedule> for Schedule {
    fn from(s: WireSchedule) -> Self {
        Schedule {
            period: period_from_icalendar(&s.icalendar),
            id: s.id,
            name: s.name,
            comment: s.comment,
            timezone: s.timezone,
            next_time: non_empty(s.next_time),
            last_time: non_empty(s.last_time),
            owner: s.owner.map(|o| o.name).unwrap_or_default(),
            creation_time: s.creation_time,
            modification_time: s.modification_time,
        }
    }
}

#[derive(Debug)]
pub struct ScheduleSpec<'a> {
    pub name: Option<&'a str>,
    pub recurrence: Option<Recurrence>,
    pub timezone: Option<&'a str>,
    pub comment: Option<&'a str>,
}

impl ScheduleSpec<'_> {
    fn apply(&self, cmd: Command) -> Command {
        let ical = self
            .recurrence
            .as_ref()
            .map(|r| render_icalendar(r, Utc::now()));
        cmd.field_opt("name", self.name)
            .field_opt("comment", self.comment)
            .field_opt("icalendar", ical.as_deref())
            .field_opt("timezone", self.timezone)
    }
}

impl ScannerSession {
    pub async fn get_schedules(&mut self) -> Result<Vec<Schedule>, VulnscanError> {
        let resp: SchedulesResponse = self
            .query(&Command::new("get_schedules").attr("filter", "rows=-1"))
            .await?;
        Ok(resp.schedules.into_iter().map(Schedule::from).collect())
    }

    pub async fn create_schedule(&mut self, spec: &ScheduleSpec<'_>) -> Result<String, VulnscanError> {
        self.create(&spec.apply(Command::new("create_schedule"))).await
    }

    pub async fn modify_schedule(
        &mut self,
        schedule_id: &str,
        spec: &ScheduleSpec<'_>,
    ) -> Result<CommandStatus, VulnscanError> {
        self.execute(&spec.apply(Command::new("modify_schedule").attr("schedule_id", schedule_id)))
            .await
    }

    pub async fn delete_schedule(&mut self, schedule_id: &str) -> Result<CommandStatus, VulnscanError> {
        self.execute(
            &Command::new("delete_schedule")
                .attr("schedule_id", schedule_id)
                .attr("ultimate", "0"),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::xml::decode;
    use super::*;
    use chrono::TimeZone;

    fn recurrence() -> Recurrence {
        Recurrence {
            dtstart: parse_dtstart("2024-05-01T03:30:00").unwrap(),
            frequency: Frequency::Weekly,
            interval: 2,
            count: Some(10),
        }
    }

    #[test]
    fn test_render_icalendar() {
        let now = Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap();
        let ical = render_icalendar(&recurrence(), now);

        assert!(ical.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ical.contains("DTSTART:20240501T033000\r\n"));
        assert!(ical.contains("DTSTAMP:20240401T120000Z\r\n"));
        assert!(ical.contains("RRULE:FREQ=WEEKLY;INTERVAL=2;COUNT=10\r\n"));
        assert!(ical.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn test_period_round_trip() {
        let ical = render_icalendar(&recurrence(), Utc::now());
        assert_eq!(period_from_icalendar(&ical).as_deref(), Some("Every 2 week(s)"));
    }

    #[test]
    fn test_period_defaults_interval() {
        let ical = "BEGIN:VEVENT\nRRULE:FREQ=DAILY\nEND:VEVENT";
        assert_eq!(period_from_icalendar(ical).as_deref(), Some("Every 1 day(s)"));
        assert_eq!(period_from_icalendar("BEGIN:VEVENT\nEND:VEVENT"), None);
    }

    #[test]
    fn test_parse_dtstart_rejects_other_formats() {
        assert!(parse_dtstart("2024-05-01 03:30").is_err());
        assert!(parse_dtstart("01/05/2024").is_err());
    }

    #[test]
    fn test_frequency_parse() {
        assert_eq!("Monthly".parse::<Frequency>().unwrap(), Frequency::Monthly);
        assert!(matches!("fortnightly".parse::<Frequency>(), Err(VulnscanError::Validation(_))));
    }

    #[test]
    fn test_decode_schedules() {
        let xml = "<get_schedules_response status=\"200\" status_text=\"OK\">\
            <schedule id=\"s1\"><owner><name>admin</name></owner><name>Nightly</name><comment/>\
            <icalendar>BEGIN:VCALENDAR\nBEGIN:VEVENT\nDTSTART:20240501T010000Z\nRRULE:FREQ=DAILY;INTERVAL=1\nEND:VEVENT\nEND:VCALENDAR</icalendar>\
            <timezone>UTC</timezone></schedule>\
            </get_schedules_response>";
        let resp: SchedulesResponse = decode(xml).unwrap();
        let schedule = Schedule::from(resp.schedules.into_iter().next().unwrap());

        assert_eq!(schedule.name, "Nightly");
        assert_eq!(schedule.owner, "admin");
        assert_eq!(schedule.timezone, "UTC");
        assert_eq!(schedule.period.as_deref(), Some("Every 1 day(s)"));
        assert_eq!(schedule.next_time, None);
    }
}
