pub mod aws_s3;
