use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SignInParams {
    pub return_to: Option<String>,
}

/// Login form body / 登录表单
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub return_to: Option<String>,
}
