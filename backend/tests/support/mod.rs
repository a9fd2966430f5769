#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use timetable_engine::db::LocalRepository;
use timetable_engine::models::{
    ClassId, School, SchoolClass, SchoolId, Subject, SubjectId, User, UserId, UserRole,
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

pub const SCHOOL: SchoolId = SchoolId(1);
pub const OTHER_SCHOOL: SchoolId = SchoolId(2);

pub const C1: ClassId = ClassId(1);
pub const C2: ClassId = ClassId(2);
pub const FOREIGN_CLASS: ClassId = ClassId(20);

pub const MATH: SubjectId = SubjectId(1);
pub const ENGLISH: SubjectId = SubjectId(2);
pub const SCIENCE: SubjectId = SubjectId(3);

pub const T1: UserId = UserId(1);
pub const T2: UserId = UserId(2);
pub const STUDENT: UserId = UserId(3);
pub const FOREIGN_TEACHER: UserId = UserId(20);

/// A repository holding two schools' directories and no scheduling data.
///
/// School 1 has classes C1/C2, subjects Math/English/Science, teachers
/// "T1 One" and "T2 Two" and a student. School 2 has one class and one
/// teacher, used to check that lookups never cross schools.
pub fn seeded_repository() -> LocalRepository {
    let repo = LocalRepository::new();
    repo.add_school(School::new(SCHOOL, "Northside"));
    repo.add_school(School::new(OTHER_SCHOOL, "Southside"));

    repo.add_class(SchoolClass::new(C1, SCHOOL, "C1"));
    repo.add_class(SchoolClass::new(C2, SCHOOL, "C2"));
    repo.add_class(SchoolClass::new(FOREIGN_CLASS, OTHER_SCHOOL, "S1"));

    repo.add_subject(Subject::new(MATH, SCHOOL, "Math"));
    repo.add_subject(Subject::new(ENGLISH, SCHOOL, "English"));
    repo.add_subject(Subject::new(SCIENCE, SCHOOL, "Science"));

    repo.add_user(User::teacher(T1, SCHOOL, "T1", "One"));
    repo.add_user(User::teacher(T2, SCHOOL, "T2", "Two"));
    repo.add_user(User::new(STUDENT, SCHOOL, "Sam", "Student", UserRole::Student));
    repo.add_user(User::teacher(FOREIGN_TEACHER, OTHER_SCHOOL, "Fay", "Far"));
    repo
}

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}
