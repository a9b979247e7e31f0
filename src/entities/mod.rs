//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the system-of-record tables: roster, schedules and ledger entries.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod attendance_day;
pub mod attendance_mark;
pub mod fee_component;
pub mod fee_payment;
pub mod fee_schedule;
pub mod student;

// Re-export specific types to avoid conflicts
pub use attendance_day::{
    Column as AttendanceDayColumn, Entity as AttendanceDay, Model as AttendanceDayModel,
};
pub use attendance_mark::{
    Column as AttendanceMarkColumn, Entity as AttendanceMark, Model as AttendanceMarkModel,
};
pub use fee_component::{
    Column as FeeComponentColumn, Entity as FeeComponent, Model as FeeComponentModel,
};
pub use fee_payment::{Column as FeePaymentColumn, Entity as FeePayment, Model as FeePaymentModel};
pub use fee_schedule::{
    Column as FeeScheduleColumn, Entity as FeeSchedule, Model as FeeScheduleModel,
};
pub use student::{Column as StudentColumn, Entity as Student, Model as StudentModel};
