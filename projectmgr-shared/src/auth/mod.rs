/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: JWT access/refresh token generation and validation
/// - [`middleware`]: Bearer-token identity resolution into [`middleware::AuthContext`]
/// - [`authorization`]: Ownership predicates for projects
///
/// # Example
///
/// ```no_run
/// use projectmgr_shared::auth::password::{hash_password, verify_password};
/// use projectmgr_shared::auth::jwt::{create_token, validate_access_token, Claims, TokenType};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(42, TokenType::Access);
/// let token = create_token(&claims, "secret-key")?;
/// assert_eq!(validate_access_token(&token, "secret-key")?.sub, 42);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
