mod callback;
mod health;
