use std::io::stderr;

use anyhow::{anyhow, bail, ensure, Context, Result};
use tokio::io::{stdin, AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use phonebook::{
    api_url_from_env,
    client::Client,
    config::Config,
    contact::{Contact, Field},
    directory::{CreationForm, Directory},
    session::{EditSession, SessionError},
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(stderr))
        .init();

    let api_url = api_url_from_env()?;
    let config = Config::from_env()?;

    let client = Client::start(&api_url, &config)?;
    tracing::info!("Using contacts at {}", client.url());

    let (directory, mut notifications) = Directory::new(client, &config);

    directory.load().await;
    print_contacts(&directory.visible());

    let mut session = EditSession::default();
    let mut lines = BufReader::new(stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();

        if line == "quit" {
            break;
        }

        if !line.is_empty() {
            if let Err(err) = execute(&directory, &mut session, line).await {
                println!("{:#}", err);
            }
        }

        while let Ok(notification) = notifications.try_recv() {
            println!("{}", notification);
        }
    }

    Ok(())
}

async fn execute(directory: &Directory, session: &mut EditSession, line: &str) -> Result<()> {
    let (command, args) = line
        .split_once(' ')
        .map_or((line, ""), |(command, args)| (command, args.trim()));

    match command {
        "help" => print_help(),
        "list" => print_contacts(&directory.visible()),
        "reload" => {
            directory.load().await;
            print_contacts(&directory.visible());
        }
        "search" => {
            directory.search(args);
            print_contacts(&directory.visible());
        }
        "add" => {
            directory.open_create();
            print_form(&directory.form());
        }
        "new" => {
            ensure!(directory.form().open, "Use add to open the new contact form");

            let (field, value) = parse_assignment(args)?;
            directory.set_new_field(field, value);
        }
        "submit" => {
            ensure!(directory.form().open, "Use add to open the new contact form");

            if directory.submit_new().await.is_ok() {
                print_contacts(&directory.visible());
            }
        }
        "close" => directory.close_create(),
        "edit" => {
            let contact = select(directory, args)?;
            session.open(contact)?;

            print_contact(session.working());
        }
        "set" => {
            let (field, value) = parse_assignment(args)?;
            session.set_field(field, value)?;
        }
        "save" => match session.commit(directory).await {
            Ok(()) => print_contacts(&directory.visible()),
            // Already reported as a notification.
            Err(SessionError::Rejected(_err)) => (),
            Err(err) => return Err(err.into()),
        },
        "cancel" => session.cancel()?,
        "delete" => {
            let contact = select(directory, args)?;

            if directory.remove(&contact).await.is_ok() {
                print_contacts(&directory.visible());
            }
        }
        command => bail!("Unknown command {}, try help", command),
    }

    Ok(())
}

/// Picks a contact by its one-based position in the displayed list.
fn select(directory: &Directory, args: &str) -> Result<Contact> {
    let pos = args
        .parse::<usize>()
        .with_context(|| format!("Expected the number of a contact, not {:?}", args))?;

    directory
        .visible()
        .into_iter()
        .nth(pos.wrapping_sub(1))
        .ok_or_else(|| anyhow!("There is no contact number {}", pos))
}

fn parse_assignment(args: &str) -> Result<(Field, String)> {
    let (field, value) = args.split_once(' ').unwrap_or((args, ""));

    Ok((field.parse()?, value.trim().to_owned()))
}

fn print_contacts(contacts: &[Contact]) {
    if contacts.is_empty() {
        println!("No contacts");
        return;
    }

    for (pos, contact) in contacts.iter().enumerate() {
        println!("{:>3}. {}  {}", pos + 1, contact.display_name(), contact.tel);
    }
}

fn print_contact(contact: &Contact) {
    for field in Field::ALL {
        println!("{:>12} ({}): {}", field.label(), field, contact.get(field));
    }
}

fn print_form(form: &CreationForm) {
    for field in Field::ALL {
        println!("{:>12} ({}): {}", field.label(), field, form.draft.get(field));
    }
}

fn print_help() {
    println!(
        "\
list                  show the contacts
reload                fetch the contacts again
search <text>         filter the contacts
add                   open the new contact form
new <field> <value>   fill in the new contact form
submit                create the new contact
close                 close the new contact form
edit <n>              edit contact number n
set <field> <value>   change the contact being edited
save                  save the contact being edited
cancel                discard the changes to the contact being edited
delete <n>            delete contact number n
quit                  leave

Fields are name_first, name_last and tel."
    );
}
