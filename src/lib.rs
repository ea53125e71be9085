pub mod decentlab;
pub mod element;
pub mod table;
