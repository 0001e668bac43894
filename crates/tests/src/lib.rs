#[cfg(test)]
mod common;


#[cfg(test)]
mod rate_limit_tests;

#[cfg(test)]
mod user_tests;


#[cfg(test)]
mod case_tests;

#[cfg(test)]
mod access_tests;


#[cfg(test)]
mod evidence_tests;

#[cfg(test)]
mod chat_tests;
