pub mod area;
pub mod department;
pub mod technician;
pub mod ticket;
