//! Directory records owned by the surrounding school system.
//!
//! The engine only reads these; it never creates or mutates them.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::ids::{ClassId, SchoolId, SubjectId, UserId};
use super::timetable::DayOfWeek;

/// Which days a school teaches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchoolCalendar {
    /// Monday to Friday.
    #[default]
    FiveDay,
    /// Monday to Sunday.
    SevenDay,
}

impl SchoolCalendar {
    pub fn days(&self) -> &'static [DayOfWeek] {
        match self {
            SchoolCalendar::FiveDay => &DayOfWeek::WEEKDAYS,
            SchoolCalendar::SevenDay => &DayOfWeek::ALL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchoolCalendar::FiveDay => "five_day",
            SchoolCalendar::SevenDay => "seven_day",
        }
    }
}

impl FromStr for SchoolCalendar {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "five_day" | "5" | "weekdays" => Ok(SchoolCalendar::FiveDay),
            "seven_day" | "7" | "full_week" => Ok(SchoolCalendar::SevenDay),
            _ => Err(format!("Unknown school calendar: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub id: SchoolId,
    pub name: String,
    #[serde(default)]
    pub calendar: SchoolCalendar,
}

impl School {
    pub fn new(id: SchoolId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            calendar: SchoolCalendar::default(),
        }
    }

    pub fn with_calendar(mut self, calendar: SchoolCalendar) -> Self {
        self.calendar = calendar;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolClass {
    pub id: ClassId,
    pub school_id: SchoolId,
    pub name: String,
}

impl SchoolClass {
    pub fn new(id: ClassId, school_id: SchoolId, name: impl Into<String>) -> Self {
        Self {
            id,
            school_id,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub school_id: SchoolId,
    pub name: String,
}

impl Subject {
    pub fn new(id: SubjectId, school_id: SchoolId, name: impl Into<String>) -> Self {
        Self {
            id,
            school_id,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Teacher,
    Student,
    Parent,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Teacher => "teacher",
            UserRole::Student => "student",
            UserRole::Parent => "parent",
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "teacher" => Ok(UserRole::Teacher),
            "student" => Ok(UserRole::Student),
            "parent" => Ok(UserRole::Parent),
            _ => Err(format!("Unknown user role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub school_id: SchoolId,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

impl User {
    pub fn new(
        id: UserId,
        school_id: SchoolId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            id,
            school_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            role,
        }
    }

    /// Shorthand for a user with the teacher role.
    pub fn teacher(
        id: UserId,
        school_id: SchoolId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self::new(id, school_id, first_name, last_name, UserRole::Teacher)
    }

    /// "First Last", or whichever part is present.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    pub fn is_teacher(&self) -> bool {
        self.role == UserRole::Teacher
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_days() {
        assert_eq!(SchoolCalendar::FiveDay.days().len(), 5);
        assert_eq!(SchoolCalendar::SevenDay.days().len(), 7);
        assert_eq!(SchoolCalendar::default(), SchoolCalendar::FiveDay);
        assert_eq!(
            "seven_day".parse::<SchoolCalendar>().unwrap(),
            SchoolCalendar::SevenDay
        );
    }

    #[test]
    fn test_full_name() {
        let user = User::teacher(UserId(1), SchoolId(1), "Ada", "Lovelace");
        assert_eq!(user.full_name(), "Ada Lovelace");

        let mononym = User::teacher(UserId(2), SchoolId(1), "Plato", "");
        assert_eq!(mononym.full_name(), "Plato");
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("Teacher".parse::<UserRole>().unwrap(), UserRole::Teacher);
        assert!("janitor".parse::<UserRole>().is_err());
        assert!(!User::new(UserId(3), SchoolId(1), "A", "B", UserRole::Student).is_teacher());
    }
}
