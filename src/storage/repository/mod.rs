pub mod area_repo;
pub mod department_repo;
pub mod technician_repo;
pub mod ticket_repo;

pub use area_repo::{AreaForm, AreaRepository};
pub use department_repo::{DepartmentForm, DepartmentRepository};
pub use technician_repo::{TechnicianForm, TechnicianRepository};
pub use ticket_repo::{NewTicket, TicketDto, TicketQuery, TicketRepository, TicketView};
