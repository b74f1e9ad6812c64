//! Client-credentials authentication against the catalog's OAuth endpoint.

mod token;

pub use token::{
    BearerToken, ClientCredentials, SpotifyTokenProvider, TokenProvider, TokenState,
    DEFAULT_TOKEN_URL,
};
