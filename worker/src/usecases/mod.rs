pub mod release_expired_holds;
