pub mod form;
pub mod qr;
pub mod ticket;
pub mod ticket_id;
pub mod upload;
pub mod vocab;

pub use ticket_id::TicketId;
