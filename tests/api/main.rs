mod guards;
mod health_check;
mod login;
mod users;
