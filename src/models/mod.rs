//! Modelos del sistema
//!
//! Este módulo contiene los registros del dominio tal como se persisten y se
//! exponen en JSON.

pub mod agency;
pub mod order;
pub mod package;
pub mod payment;
pub mod rate;
pub mod route;
pub mod transportist;

pub use agency::Agency;
pub use order::{CostBreakdown, History, HistoryEntry, Order, OrderStatus, Party};
pub use package::{Package, PaymentType, ServiceType, WeightBracket};
pub use payment::{CarrierPayment, RouteSheetPayment};
pub use rate::{RateEntry, RateTable, DEFAULT_PROVINCE};
pub use route::{OptimizedRoute, OptimizedStop, Route, RouteLeg, RouteStatus, StopPriority};
pub use transportist::{Transportist, TransportistType};
