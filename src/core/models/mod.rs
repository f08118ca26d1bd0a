pub mod expense;
pub mod user;

pub use expense::{Expense, ExpenseChanges, ExpenseFilter, NewExpense};
pub use user::User;
