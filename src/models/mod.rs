pub mod history;
pub mod parcel;
