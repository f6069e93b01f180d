pub mod admin_log;
pub mod contract_transaction;
pub mod deployment;
pub mod loan;
pub mod member;
pub mod proposal;
pub mod saving;

pub use admin_log::AdminLog;
pub use contract_transaction::ContractTransaction;
pub use deployment::Deployment;
pub use loan::{Loan, LoanStatus, NewLoan};
pub use member::{Member, MemberSummary, NewMember, Role, WalletAddress};
pub use proposal::{Proposal, ProposalStatus, Vote};
pub use saving::{Saving, SavingKind};
