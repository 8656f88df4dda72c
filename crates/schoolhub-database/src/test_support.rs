//! Small records shared by the unit tests of this crate.

use sqlx::FromRow;

use schoolhub_core::result::AppResult;

use crate::filter::ArgList;
use crate::record::Record;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Room {
    pub id: String,
    pub school_id: String,
    pub name: String,
    #[sqlx(skip)]
    pub desks: Vec<Desk>,
    #[sqlx(skip)]
    pub school: Option<Box<Campus>>,
}

impl Room {
    pub fn new(id: &str, school_id: &str, name: &str) -> Self {
        Self {
            id: id.into(),
            school_id: school_id.into(),
            name: name.into(),
            desks: Vec::new(),
            school: None,
        }
    }
}

impl Record for Room {
    const ENTITY: &'static str = "Room";
    const TABLE: &'static str = "rooms";
    const COLUMNS: &'static [&'static str] = &["id", "school_id", "name"];
    const WRITABLE: &'static [&'static str] = &["school_id", "name"];

    fn id(&self) -> &str {
        &self.id
    }

    fn bind_writable(&self, args: &mut ArgList) -> AppResult<()> {
        args.push(self.school_id.clone())?;
        args.push(self.name.clone())?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Desk {
    pub id: String,
    pub room_id: String,
    #[sqlx(skip)]
    pub chairs: Vec<String>,
}

impl Desk {
    pub fn new(id: &str, room_id: &str) -> Self {
        Self {
            id: id.into(),
            room_id: room_id.into(),
            chairs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Campus {
    pub id: String,
    pub name: String,
}

/// Check that a record's declared columns and its bind order agree.
pub fn assert_record_schema<R: Record>(sample: &R) {
    assert_eq!(R::COLUMNS.first(), Some(&"id"), "{} must select id first", R::ENTITY);
    for column in R::WRITABLE {
        assert!(
            R::COLUMNS.contains(column),
            "{}.{column} is writable but not selected",
            R::ENTITY
        );
    }
    let mut args = ArgList::new();
    sample.bind_writable(&mut args).unwrap();
    assert_eq!(args.len(), R::WRITABLE.len(), "{} bind count", R::ENTITY);
}
