//! Portal models

pub mod donation;
pub mod profile;
pub mod session;
pub mod user;

// Re-export for convenience
pub use donation::DonationRecord;
pub use profile::{
    Address, ClientId, CompanyProfileRequest, CompleteProfile, ProfileKind, ProfileResponse,
    ResidenceProfileRequest,
};
pub use session::{AccountType, AuthState, Session};
pub use user::{
    GoogleAccount, GoogleLoginRequest, GoogleLoginResponse, LoginRequest, LoginResponse,
    RegisterRequest, RegisterResponse, SignUpForm,
};
