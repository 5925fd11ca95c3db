pub mod draft;
pub mod field;
pub mod form;
pub mod masks;
pub mod participant;
pub mod sections;
