//! Access-control policy for tickets.
//!
//! Every function takes the storage backend as an explicit argument and
//! re-reads the caller's stored record before deciding anything.

pub mod tickets;

pub use tickets::{
    can_view, create_ticket, list_tickets, read_ticket, resolve_ticket_organization,
    ticket_scope, CreateTicket,
};
