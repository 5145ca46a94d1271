pub mod applicant;
pub mod currency;
pub mod offering;
