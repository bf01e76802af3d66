use std::convert::Infallible;

use clap::builder::TypedValueParser;
use clap::Args;

use common::crypto::{generate_random_password, DEFAULT_PASSWORD_LENGTH};

#[derive(Args, Debug, Clone)]
pub struct Password {
    /// Number of characters
    #[arg(long, default_value_t = DEFAULT_PASSWORD_LENGTH,
        value_parser = clap::value_parser!(u16).range(1..).map(usize::from))]
    pub length: usize,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Password {
    type Error = Infallible;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        Ok(generate_random_password(self.length))
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser, Debug)]
    struct Cli {
        #[command(flatten)]
        password: Password,
    }

    #[test]
    fn test_length_flag() {
        let cli = Cli::try_parse_from(["password"]).unwrap();
        assert_eq!(cli.password.length, DEFAULT_PASSWORD_LENGTH);

        let cli = Cli::try_parse_from(["password", "--length", "48"]).unwrap();
        assert_eq!(cli.password.length, 48);

        assert!(Cli::try_parse_from(["password", "--length", "0"]).is_err());
        assert!(Cli::try_parse_from(["password", "--length", "-3"]).is_err());
    }
}
